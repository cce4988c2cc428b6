//! Error list shared by every compile stage, plus the installed listener

use super::listener::{CompilerEvent, CompilerListener};
use super::{CompileError, CompileErrorCode};
use crate::config::compile_time::translation::MAX_ERRORS_PER_COMPILE;
use crate::log_error;

#[derive(Default)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
    listener: Option<Box<dyn CompilerListener>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listener(&mut self, listener: Box<dyn CompilerListener>) {
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn CompilerListener>> {
        self.listener.take()
    }

    pub fn listener_mut(&mut self) -> Option<&mut (dyn CompilerListener + 'static)> {
        self.listener.as_deref_mut()
    }

    /// Record an error. The listener sees it first; unhandled errors are
    /// logged. Past the per-compile cap one `TooManyErrors` is recorded and
    /// the rest are dropped.
    pub fn add(&mut self, error: CompileError) {
        if self.errors.len() > MAX_ERRORS_PER_COMPILE {
            return;
        }
        let error = if self.errors.len() == MAX_ERRORS_PER_COMPILE {
            CompileError::new(CompileErrorCode::TooManyErrors, &error.file, error.line)
        } else {
            error
        };

        let handled = self
            .listener
            .as_deref_mut()
            .is_some_and(|listener| listener.handle_error(&error));
        if !handled {
            log_error!(error.code.code(), &error.to_string(),
                "file" => &error.file,
                "line" => error.line
            );
        }
        self.errors.push(error);
    }

    pub fn add_error(&mut self, code: CompileErrorCode, file: &str, line: u32, message: Option<&str>) {
        let mut error = CompileError::new(code, file, line);
        if let Some(message) = message {
            error = error.with_message(message);
        }
        self.add(error);
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Listener's answer to a name exclusion question, if it has one
    pub fn name_exclusion(&mut self, cls: &str, parent: Option<&str>) -> Option<bool> {
        let event = CompilerEvent::NameExclusion { cls, parent };
        self.listener.as_deref_mut()?.handle_event(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<CompileErrorCode>>>);

    impl CompilerListener for Recorder {
        fn handle_error(&mut self, error: &CompileError) -> bool {
            self.0.borrow_mut().push(error.code);
            true
        }
    }

    #[test]
    fn test_listener_sees_errors_and_they_are_still_recorded() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut diagnostics = Diagnostics::new();
        diagnostics.set_listener(Box::new(Recorder(Rc::clone(&seen))));

        diagnostics.add_error(CompileErrorCode::NumberExpected, "a.material", 4, None);

        assert_eq!(*seen.borrow(), vec![CompileErrorCode::NumberExpected]);
        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(diagnostics.errors()[0].line, 4);
    }

    #[test]
    fn test_error_cap() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.set_listener(Box::new(Recorder(Rc::default())));
        for line in 0..(MAX_ERRORS_PER_COMPILE as u32 + 5) {
            diagnostics.add_error(CompileErrorCode::UnexpectedToken, "a.material", line, None);
        }

        let errors = diagnostics.errors();
        assert_eq!(errors.len(), MAX_ERRORS_PER_COMPILE + 1);
        assert_eq!(errors[MAX_ERRORS_PER_COMPILE].code, CompileErrorCode::TooManyErrors);
    }

    #[test]
    fn test_name_exclusion_without_listener() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.name_exclusion("emitter", Some("particle_system")), None);
    }
}
