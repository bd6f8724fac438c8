//! Command handler: the pipeline's only public entry point.
//!
//! `detect → sanitize → vet → route`. Every collaborator is built
//! independently; one that fails to construct is replaced by its stand-in
//! from [`fallback`](super::fallback) and the rest keep full strength.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::CommandResult;
use crate::logging::{self, Category};
use crate::process::{ProcessRunner, SystemRunner};
use crate::site::{ActivityLog, WordPress};

use super::detector::{CommandDetector, CommandKind, Detect};
use super::fallback::{
    ExplicitOnlyDetector, MinimalPhpExecutor, MinimalSanitizer, MinimalSecurity,
    MinimalWpCliExecutor,
};
use super::php::PhpExecutor;
use super::result::{CommandInput, ExecutionResult, Parameters, merge_parameters};
use super::sanitizer::{CommandSanitizer, Sanitize};
use super::security::{CommandSecurity, SecurityCheck};
use super::wp_cli::WpCliExecutor;
use super::{CommandExecutor, ExecutorSettings};

const NO_COMMAND_DETECTED: &str = "No command detected";

const DETECTION_MISS_OUTPUT: &str = "I couldn't determine what command to run for that request. \
     Try rephrasing it, or give an explicit command such as `wp plugin list`.";

pub struct CommandHandler {
    sanitizer: Box<dyn Sanitize>,
    security: Box<dyn SecurityCheck>,
    wp_cli: Box<dyn CommandExecutor>,
    php: Box<dyn CommandExecutor>,
    detector: Box<dyn Detect>,
}

impl CommandHandler {
    #[must_use]
    pub fn builder(site: Arc<dyn WordPress>) -> HandlerBuilder {
        HandlerBuilder::new(site)
    }

    /// Run an explicit or natural-language command.
    ///
    /// Structured input is flattened first; its embedded parameters sit under
    /// `parameters`. Never panics and never fails: every outcome is a result.
    pub fn execute_command(
        &self,
        input: impl Into<CommandInput>,
        parameters: Parameters,
    ) -> ExecutionResult {
        let (raw, parameters) = match input.into() {
            CommandInput::Text(command) => (command, parameters),
            CommandInput::Structured {
                command,
                parameters: embedded,
            } => (command, merge_parameters(&embedded, &parameters)),
        };

        shield(&raw, || {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                let message = "No command provided";
                return ExecutionResult::failure(trimmed, message).with_error(message);
            }

            if is_explicit(trimmed) {
                return self.run(trimmed, &parameters);
            }
            match self.detector.detect_command(trimmed) {
                Some(detected) => {
                    let merged = merge_parameters(&detected.parameters, &parameters);
                    self.run(&detected.command, &merged)
                }
                None => self.run(trimmed, &parameters),
            }
        })
    }

    /// Classify a chat message and run what it asks for.
    ///
    /// A detection miss is a distinguishable failure with
    /// `error = "No command detected"`.
    pub fn process_request(&self, message: &str, context: Parameters) -> ExecutionResult {
        shield(message, || {
            let Some(detected) = self.detector.detect_command(message) else {
                logging::info(Category::Handler, "No command detected in request");
                return ExecutionResult::failure(message.trim(), DETECTION_MISS_OUTPUT)
                    .with_error(NO_COMMAND_DETECTED);
            };

            logging::info(
                Category::Handler,
                format!("Detected {} command", detected.kind.as_str()),
            );
            let merged = merge_parameters(&detected.parameters, &context);
            let mut result = self.run(&detected.command, &merged);
            if result.command_type.is_none() && detected.kind != CommandKind::Explicit {
                result.command_type = Some(detected.kind.as_str().to_string());
            }
            result
        })
    }

    /// Sanitize, vet and route one command.
    fn run(&self, command: &str, parameters: &Parameters) -> ExecutionResult {
        let sanitized = self.sanitizer.sanitize(command);
        let parameters = self.sanitizer.clean_parameters(parameters);
        let loggable = self.security.get_safe_command_for_logging(&sanitized);

        if sanitized.is_empty() {
            let message = "Command is empty after sanitization";
            return ExecutionResult::failure(sanitized, message).with_error(message);
        }

        if self.security.is_dangerous(command) || self.security.is_dangerous(&sanitized) {
            logging::warn(Category::Security, format!("Blocked command: {loggable}"));
            return ExecutionResult::blocked(sanitized);
        }

        logging::info(Category::Handler, format!("Executing command: {loggable}"));
        if sanitized == "php" || sanitized.starts_with("php ") {
            self.php.execute(&sanitized, &parameters)
        } else {
            self.wp_cli.execute(&sanitized, &parameters)
        }
    }
}

fn is_explicit(command: &str) -> bool {
    command.starts_with("wp ") || command.starts_with("php ")
}

/// Convert a panic escaping a collaborator into an error result.
fn shield(command: &str, run: impl FnOnce() -> ExecutionResult) -> ExecutionResult {
    catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        logging::error(
            Category::Handler,
            format!("Unexpected failure while executing command: {message}"),
        );
        ExecutionResult::error(command.trim(), format!("internal error: {message}"))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// === Builder ===

/// Composes a [`CommandHandler`].
///
/// Component overrides take a `CommandResult` so a failed construction can be
/// handed in directly; it is replaced by the matching minimal stand-in.
pub struct HandlerBuilder {
    site: Arc<dyn WordPress>,
    activity: Option<Arc<dyn ActivityLog>>,
    runner: Arc<dyn ProcessRunner>,
    settings: ExecutorSettings,
    sanitizer: Option<CommandResult<Box<dyn Sanitize>>>,
    security: Option<CommandResult<Box<dyn SecurityCheck>>>,
    wp_cli: Option<CommandResult<Box<dyn CommandExecutor>>>,
    php: Option<CommandResult<Box<dyn CommandExecutor>>>,
    detector: Option<CommandResult<Box<dyn Detect>>>,
}

impl HandlerBuilder {
    #[must_use]
    pub fn new(site: Arc<dyn WordPress>) -> Self {
        Self {
            site,
            activity: None,
            runner: Arc::new(SystemRunner::default()),
            settings: ExecutorSettings::default(),
            sanitizer: None,
            security: None,
            wp_cli: None,
            php: None,
            detector: None,
        }
    }

    #[must_use]
    pub fn activity_log(mut self, log: Arc<dyn ActivityLog>) -> Self {
        self.activity = Some(log);
        self
    }

    #[must_use]
    pub fn runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn sanitizer(mut self, sanitizer: CommandResult<Box<dyn Sanitize>>) -> Self {
        self.sanitizer = Some(sanitizer);
        self
    }

    #[must_use]
    pub fn security(mut self, security: CommandResult<Box<dyn SecurityCheck>>) -> Self {
        self.security = Some(security);
        self
    }

    #[must_use]
    pub fn wp_cli(mut self, executor: CommandResult<Box<dyn CommandExecutor>>) -> Self {
        self.wp_cli = Some(executor);
        self
    }

    #[must_use]
    pub fn php(mut self, executor: CommandResult<Box<dyn CommandExecutor>>) -> Self {
        self.php = Some(executor);
        self
    }

    #[must_use]
    pub fn detector(mut self, detector: CommandResult<Box<dyn Detect>>) -> Self {
        self.detector = Some(detector);
        self
    }

    #[must_use]
    pub fn build(self) -> CommandHandler {
        let Self {
            site,
            activity,
            runner,
            settings,
            sanitizer,
            security,
            wp_cli,
            php,
            detector,
        } = self;

        let sanitizer = sanitizer.unwrap_or_else(|| {
            CommandSanitizer::new().map(|s| Box::new(s) as Box<dyn Sanitize>)
        });
        let security = security.unwrap_or_else(|| {
            CommandSecurity::new().map(|s| Box::new(s) as Box<dyn SecurityCheck>)
        });
        let wp_cli = wp_cli.unwrap_or_else(|| {
            WpCliExecutor::new(runner.clone(), site.clone(), settings.clone()).map(|executor| {
                let executor = match &activity {
                    Some(log) => executor.with_activity_log(log.clone()),
                    None => executor,
                };
                Box::new(executor) as Box<dyn CommandExecutor>
            })
        });
        let php = php.unwrap_or_else(|| {
            PhpExecutor::new(runner.clone(), site.clone(), &settings)
                .map(|executor| Box::new(executor) as Box<dyn CommandExecutor>)
        });
        let detector = detector.unwrap_or_else(|| {
            CommandDetector::new().map(|d| Box::new(d) as Box<dyn Detect>)
        });

        CommandHandler {
            sanitizer: resolve("sanitizer", sanitizer, || {
                Box::new(MinimalSanitizer) as Box<dyn Sanitize>
            }),
            security: resolve("security filter", security, || {
                Box::new(MinimalSecurity) as Box<dyn SecurityCheck>
            }),
            wp_cli: resolve("WP-CLI executor", wp_cli, || {
                Box::new(MinimalWpCliExecutor::new(site.clone())) as Box<dyn CommandExecutor>
            }),
            php: resolve("PHP executor", php, || {
                Box::new(MinimalPhpExecutor::new(site.clone())) as Box<dyn CommandExecutor>
            }),
            detector: resolve("detector", detector, || {
                Box::new(ExplicitOnlyDetector) as Box<dyn Detect>
            }),
        }
    }
}

/// Keep a built component or fall back to its stand-in.
fn resolve<T: ?Sized>(
    component: &str,
    built: CommandResult<Box<T>>,
    fallback: impl FnOnce() -> Box<T>,
) -> Box<T> {
    built.unwrap_or_else(|err| {
        logging::error(
            Category::Handler,
            format!("Failed to initialize {component}, using minimal fallback: {err}"),
        );
        fallback()
    })
}
