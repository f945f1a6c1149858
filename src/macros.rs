#[macro_export]
macro_rules! fatal(
    ($msg:expr, $($arg:expr),*) => (
        $crate::driver::session().err(format!($msg, $($arg),*))
    );
);

#[macro_export]
macro_rules! fatal_at(
    ($msg:expr, $($arg:expr),*; $line:expr) => (
        $crate::driver::session().span_err(format!($msg, $($arg),*), $line)
    );
);
