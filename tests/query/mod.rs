#[cfg(unix)]
pub(crate) mod support;
