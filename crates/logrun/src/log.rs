//! Command logging callbacks

use std::fmt::{self, Display};
use std::sync::Arc;

use tracing::debug;

/// Callback invoked with the formatted command line before each execution
///
/// It receives a list of printable values; runners always pass exactly one,
/// the formatted command string.
pub type LogFn = Arc<dyn Fn(&[&dyn Display]) + Send + Sync>;

/// A callback that drops everything (the default)
#[must_use]
pub fn discard_log() -> LogFn {
    Arc::new(|_| {})
}

/// Wrap a closure as a [`LogFn`]
pub fn log_fn<F>(f: F) -> LogFn
where
    F: Fn(&[&dyn Display]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A callback that emits each command as a `tracing` debug event
/// under the `logrun::command` target
#[must_use]
pub fn tracing_log() -> LogFn {
    Arc::new(|values| {
        debug!(target: "logrun::command", "{}", Rendered(values));
    })
}

/// Join values with single spaces
#[must_use]
pub fn render(values: &[&dyn Display]) -> String {
    Rendered(values).to_string()
}

struct Rendered<'a>(&'a [&'a dyn Display]);

impl Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            value.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(render(&[]), "");
        assert_eq!(render(&[&"ls -1"]), "ls -1");
        assert_eq!(render(&[&"exit", &3]), "exit 3");
    }

    #[test]
    fn test_log_fn_receives_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let f = log_fn(move |values| sink.lock().unwrap().push(render(values)));

        f(&[&"/bin/true"]);
        discard_log()(&[&"ignored"]);
        tracing_log()(&[&"traced"]);

        assert_eq!(*seen.lock().unwrap(), vec!["/bin/true".to_string()]);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_log_emits_debug_event() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing_log()(&[&"/usr/bin/stat --dereference --format %n:%F /bin/sh"]);
        });

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("DEBUG"));
        assert!(out.contains("logrun::command"));
        assert!(out.contains("/usr/bin/stat --dereference --format %n:%F /bin/sh"));
    }
}
