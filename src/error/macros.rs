//! # 错误处理宏

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::IdentityError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::IdentityError::config(format!($fmt, $($arg)*))
    };
}

/// 快速创建数据库错误的宏
#[macro_export]
macro_rules! database_error {
    ($msg:expr) => {
        $crate::error::IdentityError::database($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::IdentityError::database(format!($fmt, $($arg)*))
    };
}

/// 快速创建认证错误的宏
#[macro_export]
macro_rules! auth_error {
    ($msg:expr) => {
        $crate::error::IdentityError::auth($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::IdentityError::auth(format!($fmt, $($arg)*))
    };
}

/// 快速创建业务错误的宏
#[macro_export]
macro_rules! business_error {
    ($msg:expr) => {
        $crate::error::IdentityError::business($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::IdentityError::business(format!($fmt, $($arg)*))
    };
}

/// 快速创建内部错误的宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::IdentityError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::IdentityError::internal(format!($fmt, $($arg)*))
    };
}
