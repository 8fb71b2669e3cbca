/// Call site of the macro invocation: enclosing function, absolute file path and line.
#[doc(hidden)]
#[macro_export]
macro_rules! __caller {
    () => {
        $crate::Caller {
            func: ::std::option::Option::Some({
                fn __f() {}
                $crate::__private::short_function_name(::std::any::type_name_of_val(&__f))
            }),
            file: {
                static FILE: ::std::sync::OnceLock<::std::string::String> =
                    ::std::sync::OnceLock::new();
                FILE.get_or_init(|| {
                    $crate::__private::absolute_source_path(
                        ::std::env!("CARGO_MANIFEST_DIR"),
                        ::std::file!(),
                    )
                })
                .as_str()
            },
            line: ::std::line!(),
        }
    };
}

/// Logs a record at the given level.
///
/// ```rust
/// use teelog::Level;
///
/// let logger = teelog::logger_config().no_stdout().build().unwrap();
/// teelog::log!(logger: &logger, Level::Warn, "disk almost full", free_mb = 12);
/// // Without `logger:` the process-wide instance is used, if one is set.
/// teelog::log!(Level::Info, "nothing happens before init");
/// ```
#[macro_export]
macro_rules! log {
    (logger: $logger:expr, $level:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        let level: $crate::Level = $level;
        let logger = &$logger;
        if logger.enabled(level) {
            logger.log(
                level,
                $msg,
                &[$($crate::Field::new(::std::stringify!($key), $value)),*],
                ::std::option::Option::Some($crate::__caller!()),
            );
        }
    }};
    ($level:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        if let ::std::option::Option::Some(logger) = $crate::global() {
            $crate::log!(logger: logger, $level, $msg $(, $key = $value)*);
        }
    }};
}

/// Logs a record at DEBUG level.
#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($rest:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Debug, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::log!($crate::Level::Debug, $($rest)+)
    };
}

/// Logs a record at INFO level.
///
/// ```rust
/// teelog::init_prod("/tmp/teelog_doc_info.log").unwrap();
/// teelog::info!("user logged in", user = "lzc", attempt = 1);
/// ```
#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($rest:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Info, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::log!($crate::Level::Info, $($rest)+)
    };
}

/// Logs a record at WARN level.
#[macro_export]
macro_rules! warn {
    (logger: $logger:expr, $($rest:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Warn, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::log!($crate::Level::Warn, $($rest)+)
    };
}

/// Logs a record at ERROR level.
#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($rest:tt)+) => {
        $crate::log!(logger: $logger, $crate::Level::Error, $($rest)+)
    };
    ($($rest:tt)+) => {
        $crate::log!($crate::Level::Error, $($rest)+)
    };
}
