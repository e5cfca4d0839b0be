//! What an action sees while it executes.

use chrono::{DateTime, Utc};
use serde_json::json;
use sluice_assets::FlowReference;
use sluice_config::Environment;
use tracing::warn;

use crate::assets::SessionAssets;
use crate::contact::Contact;
use crate::engine::Engine;
use crate::error::ActionError;
use crate::events::{ErrorEvent, Event, EventBase, RunResultChangedEvent};
use crate::modifiers::Modifier;
use crate::results::RunResult;
use crate::run::Run;
use crate::services::Services;
use crate::session::Sprint;
use crate::template::is_template;

/// A sub-flow an action asked to enter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FlowEntry {
  pub flow: FlowReference,
  pub terminal: bool,
}

/// Execution context for one action on one step.
pub struct ActionContext<'a> {
  pub(crate) engine: &'a Engine,
  pub(crate) assets: &'a SessionAssets,
  pub(crate) environment: &'a Environment,
  pub(crate) contact: &'a mut Option<Contact>,
  pub(crate) run: &'a mut Run,
  /// Template view of the parent run and trigger, fixed for the step.
  pub(crate) related: serde_json::Value,
  pub(crate) node_uuid: &'a str,
  pub(crate) step_uuid: &'a str,
  pub(crate) sprint: &'a mut Sprint,
  pub(crate) flow_entry: Option<FlowEntry>,
}

impl<'a> ActionContext<'a> {
  pub fn now(&self) -> DateTime<Utc> {
    self.engine.clock.now()
  }

  pub fn new_uuid(&self) -> String {
    self.engine.uuids.next_string()
  }

  pub fn assets(&self) -> &SessionAssets {
    self.assets
  }

  pub fn environment(&self) -> &Environment {
    self.environment
  }

  pub fn services(&self) -> &Services {
    &self.engine.services
  }

  pub fn run(&self) -> &Run {
    self.run
  }

  pub fn node_uuid(&self) -> &str {
    self.node_uuid
  }

  pub fn contact(&self) -> Option<&Contact> {
    self.contact.as_ref()
  }

  /// The contact, or the fatal error for a session without one.
  pub fn require_contact(&self) -> Result<&Contact, ActionError> {
    self.contact.as_ref().ok_or(ActionError::NoContact)
  }

  /// Base fields for an event created on this step.
  pub fn event_base(&self) -> EventBase {
    EventBase::new(self.now(), Some(self.step_uuid.to_string()))
  }

  pub fn log_event(&mut self, event: Box<dyn Event>) {
    self.sprint.push_event(event);
  }

  /// Log a non-fatal error event.
  pub fn log_error(&mut self, text: impl Into<String>) {
    let text = text.into();
    warn!(
      run_uuid = %self.run.uuid,
      step_uuid = %self.step_uuid,
      error = %text,
      "action error"
    );
    let event = ErrorEvent {
      base: self.event_base(),
      text,
      fatal: false,
    };
    self.log_event(Box::new(event));
  }

  /// Apply a modifier to the contact, logging it and the events it produces.
  pub fn apply_modifier(&mut self, modifier: Box<dyn Modifier>) -> Result<(), ActionError> {
    let base = self.event_base();
    let contact = self.contact.as_mut().ok_or(ActionError::NoContact)?;
    let events = modifier.apply(contact, &base);
    self.sprint.push_modifier(modifier);
    for event in events {
      self.sprint.push_event(event);
    }
    Ok(())
  }

  /// Save a result on the run and log that it changed.
  pub fn save_result(
    &mut self,
    name: &str,
    value: &str,
    category: Option<&str>,
    input: Option<&str>,
    extra: Option<serde_json::Value>,
  ) {
    let result = RunResult {
      name: name.to_string(),
      value: value.to_string(),
      category: category.map(str::to_string),
      input: input.map(str::to_string),
      extra,
      node_uuid: self.node_uuid.to_string(),
      created_on: self.now(),
    };
    let event = RunResultChangedEvent::new(self.event_base(), &result);
    self.run.save_result(result);
    self.log_event(Box::new(event));
  }

  /// Ask the engine to enter a sub-flow once this node's actions are done.
  pub fn enter_flow(&mut self, flow: FlowReference, terminal: bool) {
    self.flow_entry = Some(FlowEntry { flow, terminal });
  }

  /// Evaluate a template, logging any errors and returning the best output.
  pub fn evaluate(&mut self, template: &str) -> String {
    if !is_template(template) {
      return template.to_string();
    }
    let context = self.template_context();
    let (output, errors) = self.engine.evaluator.evaluate(template, &context);
    for error in errors {
      self.log_error(error);
    }
    output
  }

  fn template_context(&self) -> serde_json::Value {
    let redaction = self.environment.redaction_policy;
    let mut context = json!({
      "contact": self.contact.as_ref().map(|c| c.to_context(redaction)),
      "run": self.run.summary_context(),
      "results": self.run.results_context(),
      "input": self.run.input.as_ref().map(|i| i.to_context(redaction)),
    });
    if let (Some(context), Some(related)) = (context.as_object_mut(), self.related.as_object()) {
      for (key, value) in related {
        context.insert(key.clone(), value.clone());
      }
    }
    context
  }
}
