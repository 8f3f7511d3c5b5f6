use std::collections::HashMap;
use std::fmt;

use super::action::Action;
use crate::error::RouterError;

/// Action used when a handler string names only the controller
pub const DEFAULT_ACTION: &str = "index";

/// Reference to the code a route runs.
#[derive(Clone)]
pub enum HandlerRef {
    /// A callable supplied directly at registration
    Action(Action),
    /// A `(controller, action)` pair resolved through a [`ControllerRegistry`]
    Controller { target: String, action: String },
}

impl HandlerRef {
    /// Parse a `"Controller@action"` string. A bare name selects
    /// [`DEFAULT_ACTION`].
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        match reference.split_once('@') {
            Some((target, action)) => HandlerRef::Controller {
                target: target.trim().to_string(),
                action: action.trim().to_string(),
            },
            None => HandlerRef::Controller {
                target: reference.to_string(),
                action: DEFAULT_ACTION.to_string(),
            },
        }
    }

    /// Human-readable form used in logs and the route cache
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            HandlerRef::Action(_) => "<closure>".to_string(),
            HandlerRef::Controller { target, action } => format!("{target}@{action}"),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<&str> for HandlerRef {
    fn from(reference: &str) -> Self {
        HandlerRef::parse(reference)
    }
}

impl From<String> for HandlerRef {
    fn from(reference: String) -> Self {
        HandlerRef::parse(&reference)
    }
}

impl From<(&str, &str)> for HandlerRef {
    fn from((target, action): (&str, &str)) -> Self {
        HandlerRef::Controller {
            target: target.to_string(),
            action: action.to_string(),
        }
    }
}

impl From<Action> for HandlerRef {
    fn from(action: Action) -> Self {
        HandlerRef::Action(action)
    }
}

/// A named set of actions.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    name: String,
    actions: HashMap<String, Action>,
}

impl Controller {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn action(mut self, name: &str, action: Action) -> Self {
        self.actions.insert(name.to_string(), action);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, action: &str) -> Option<&Action> {
        self.actions.get(action)
    }
}

/// Controllers addressable from handler strings.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Controller>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a controller
    pub fn register(&mut self, controller: Controller) {
        tracing::debug!(
            controller = %controller.name,
            actions = controller.actions.len(),
            "Controller registered"
        );
        self.controllers.insert(controller.name.clone(), controller);
    }

    #[must_use]
    pub fn with(mut self, controller: Controller) -> Self {
        self.register(controller);
        self
    }

    /// Resolve a handler reference to a concrete action
    pub fn resolve(&self, handler: &HandlerRef) -> Result<Action, RouterError> {
        match handler {
            HandlerRef::Action(action) => Ok(action.clone()),
            HandlerRef::Controller { target, action } => self
                .controllers
                .get(target)
                .and_then(|c| c.get(action))
                .cloned()
                .ok_or_else(|| RouterError::HandlerNotFound(handler.label())),
        }
    }
}
