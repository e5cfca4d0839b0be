//! The engine: starts sessions from triggers and resumes them.
//!
//! An [`Engine`] holds everything that is shared between sessions: the type
//! registries, the clock and UUID generator, the template evaluator and the
//! external services. Each call to [`Engine::start`] or [`Engine::resume`]
//! runs one sprint against a session it borrows exclusively.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde_json::{Map, Value};
use sluice_assets::AssetSource;
use sluice_config::{ExitDef, RouterDef};
use tracing::{debug, error, info, instrument};

use crate::actions::Action;
use crate::assets::SessionAssets;
use crate::contact::Contact;
use crate::context::{ActionContext, FlowEntry};
use crate::error::{DecodeError, EngineError};
use crate::events::{
  DialEndedEvent, ErrorEvent, Event, EventBase, FlowEnteredEvent, MsgReceivedEvent,
  RunExpiredEvent,
};
use crate::flow::{Flow, Node};
use crate::generators::{Clock, SystemClock, UuidGenerator, V4Generator};
use crate::input::Input;
use crate::modifiers::Modifier;
use crate::registry::{Constructor, Registries, Typed};
use crate::resumes::Resume;
use crate::run::{Run, RunStatus};
use crate::services::Services;
use crate::session::{Session, SessionStatus, Sprint};
use crate::switch;
use crate::template::{MiniJinjaEvaluator, TemplateEvaluator};
use crate::triggers::Trigger;
use crate::waits::Wait;
use sluice_config::Environment;

/// Default number of node visits allowed in one sprint.
pub const DEFAULT_MAX_STEPS_PER_SPRINT: usize = 100;

/// Engine limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
  /// Node visits allowed in one sprint before the session is errored.
  pub max_steps_per_sprint: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_steps_per_sprint: DEFAULT_MAX_STEPS_PER_SPRINT,
    }
  }
}

pub struct Engine {
  config: EngineConfig,
  registries: Arc<Registries>,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) uuids: Arc<dyn UuidGenerator>,
  pub(crate) evaluator: Arc<dyn TemplateEvaluator>,
  pub(crate) services: Services,
}

/// Builder for [`Engine`]. Anything not set falls back to the system clock,
/// random v4 UUIDs, the minijinja evaluator, no services and the built-in
/// registries.
pub struct EngineBuilder {
  config: EngineConfig,
  registries: Registries,
  clock: Arc<dyn Clock>,
  uuids: Arc<dyn UuidGenerator>,
  evaluator: Arc<dyn TemplateEvaluator>,
  services: Services,
}

impl Default for EngineBuilder {
  fn default() -> Self {
    Self::new()
  }
}

impl EngineBuilder {
  pub fn new() -> Self {
    Self {
      config: EngineConfig::default(),
      registries: Registries::default(),
      clock: Arc::new(SystemClock),
      uuids: Arc::new(V4Generator),
      evaluator: Arc::new(MiniJinjaEvaluator::new()),
      services: Services::new(),
    }
  }

  pub fn with_config(mut self, config: EngineConfig) -> Self {
    self.config = config;
    self
  }

  pub fn with_max_steps_per_sprint(mut self, max_steps: usize) -> Self {
    self.config.max_steps_per_sprint = max_steps;
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_uuid_generator(mut self, uuids: Arc<dyn UuidGenerator>) -> Self {
    self.uuids = uuids;
    self
  }

  pub fn with_evaluator(mut self, evaluator: Arc<dyn TemplateEvaluator>) -> Self {
    self.evaluator = evaluator;
    self
  }

  pub fn with_services(mut self, services: Services) -> Self {
    self.services = services;
    self
  }

  /// Replace the registries entirely.
  pub fn with_registries(mut self, registries: Registries) -> Self {
    self.registries = registries;
    self
  }

  pub fn register_action(mut self, tag: &str, constructor: Constructor<dyn Action>) -> Self {
    self.registries.actions.register(tag, constructor);
    self
  }

  pub fn register_event(mut self, tag: &str, constructor: Constructor<dyn Event>) -> Self {
    self.registries.events.register(tag, constructor);
    self
  }

  pub fn register_modifier(mut self, tag: &str, constructor: Constructor<dyn Modifier>) -> Self {
    self.registries.modifiers.register(tag, constructor);
    self
  }

  pub fn register_trigger(mut self, tag: &str, constructor: Constructor<dyn Trigger>) -> Self {
    self.registries.triggers.register(tag, constructor);
    self
  }

  pub fn register_resume(mut self, tag: &str, constructor: Constructor<dyn Resume>) -> Self {
    self.registries.resumes.register(tag, constructor);
    self
  }

  pub fn register_wait(mut self, tag: &str, constructor: Constructor<dyn Wait>) -> Self {
    self.registries.waits.register(tag, constructor);
    self
  }

  pub fn build(self) -> Engine {
    Engine {
      config: self.config,
      registries: Arc::new(self.registries),
      clock: self.clock,
      uuids: self.uuids,
      evaluator: self.evaluator,
      services: self.services,
    }
  }
}

impl Engine {
  pub fn builder() -> EngineBuilder {
    EngineBuilder::new()
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn registries(&self) -> &Arc<Registries> {
    &self.registries
  }

  /// A new, unstarted session.
  pub fn new_session(&self, environment: Environment, contact: Option<Contact>) -> Session {
    Session::new(self.uuids.next_string(), environment, contact)
  }

  /// Load the assets a session will run against.
  pub async fn session_assets(
    &self,
    source: Arc<dyn AssetSource>,
  ) -> Result<SessionAssets, EngineError> {
    Ok(SessionAssets::new(source, self.registries.clone()).await?)
  }

  /// Read a persisted session.
  pub fn read_session(&self, data: &[u8]) -> Result<Session, DecodeError> {
    Session::read(data, &self.registries)
  }

  pub fn read_trigger(&self, data: Value) -> Result<Box<dyn Trigger>, DecodeError> {
    self.registries.triggers.decode(data)
  }

  pub fn read_resume(&self, data: Value) -> Result<Box<dyn Resume>, DecodeError> {
    self.registries.resumes.decode(data)
  }

  /// Start a session with a trigger.
  ///
  /// The trigger's flow and every flow it can enter are loaded and validated
  /// before the session is touched, so on error the session is unchanged.
  #[instrument(
    name = "engine_start",
    skip(self, session, assets, trigger),
    fields(
      session_uuid = %session.uuid,
      flow_uuid = %trigger.flow().uuid,
    )
  )]
  pub async fn start(
    &self,
    session: &mut Session,
    assets: &SessionAssets,
    trigger: Box<dyn Trigger>,
  ) -> Result<Sprint, EngineError> {
    if !session.runs.is_empty() {
      return Err(EngineError::AlreadyStarted);
    }

    let flow = assets.flow(&trigger.flow().uuid).await?;
    self.validate_flows(&flow, assets).await?;

    let mut sprint = Sprint::new();
    let now = self.clock.now();
    let mut run = Run::new(self.uuids.next_string(), flow.reference(), None, now);
    if let Some(input) = trigger.input() {
      if let Input::Msg(msg) = &input {
        sprint.push_event(Box::new(MsgReceivedEvent {
          base: EventBase::new(now, None),
          msg: msg.clone(),
        }));
      }
      run.input = Some(input);
    }

    info!(
      session_uuid = %session.uuid,
      run_uuid = %run.uuid,
      trigger_type = trigger.type_name(),
      "session_started"
    );

    session.trigger = Some(trigger);
    session.status = SessionStatus::Active;
    session.runs.push(run);

    let entry = flow.entry().map(|n| n.uuid.clone());
    let mut sprinter = Sprinter::new(self, assets, session, sprint);
    sprinter.execute(flow, entry).await;
    Ok(sprinter.sprint)
  }

  /// Resume a waiting session.
  #[instrument(
    name = "engine_resume",
    skip(self, session, assets, resume),
    fields(
      session_uuid = %session.uuid,
      resume_type = resume.type_name(),
    )
  )]
  pub async fn resume(
    &self,
    session: &mut Session,
    assets: &SessionAssets,
    resume: Box<dyn Resume>,
  ) -> Result<Sprint, EngineError> {
    if session.status != SessionStatus::Waiting {
      return Err(EngineError::NotWaiting(session.status));
    }
    let idx = session
      .runs
      .iter()
      .rposition(|r| r.status == RunStatus::Waiting)
      .ok_or(EngineError::NoWaitingRun)?;
    let wait = session.wait.as_ref().ok_or(EngineError::NoWaitingRun)?;
    if !wait.accepts(resume.as_ref()) {
      return Err(EngineError::ResumeRejected {
        resume_type: resume.type_name(),
        wait_type: wait.type_name(),
      });
    }

    let flow = assets.flow(&session.runs[idx].flow.uuid).await?;
    let (node_uuid, step_uuid) = session.runs[idx]
      .last_step()
      .map(|s| (s.node_uuid.clone(), s.uuid.clone()))
      .ok_or(EngineError::NoWaitingRun)?;

    let now = self.clock.now();
    session.wait = None;
    let mut sprinter = Sprinter::new(self, assets, session, Sprint::new());

    if resume.expires_run() {
      let run_uuid = sprinter.session.runs[idx].uuid.clone();
      sprinter.sprint.push_event(Box::new(RunExpiredEvent {
        base: EventBase::new(now, Some(step_uuid)),
        run_uuid,
      }));
      sprinter.session.status = SessionStatus::Active;
      if let Visit::Continue(flow, destination) = sprinter.finish_run(RunStatus::Expired).await {
        sprinter.execute(flow, destination).await;
      }
      return Ok(sprinter.sprint);
    }

    if let Some(input) = resume.input() {
      let base = EventBase::new(now, Some(step_uuid.clone()));
      let event: Box<dyn Event> = match &input {
        Input::Msg(msg) => Box::new(MsgReceivedEvent {
          base,
          msg: msg.clone(),
        }),
        Input::Dial(dial) => Box::new(DialEndedEvent {
          base,
          dial: dial.clone(),
        }),
      };
      sprinter.sprint.push_event(event);
      sprinter.session.runs[idx].input = Some(input);
    }

    sprinter.session.runs[idx].set_status(RunStatus::Active, now);
    sprinter.session.runs[idx].expires_on = None;
    sprinter.session.status = SessionStatus::Active;

    let destination = match flow.node(&node_uuid) {
      Some(node) => sprinter.route(idx, node, &step_uuid),
      None => None,
    };
    sprinter.execute(flow, destination).await;
    Ok(sprinter.sprint)
  }

  /// Validate a flow and every flow reachable from it through `enter_flow`.
  async fn validate_flows(
    &self,
    root: &Arc<Flow>,
    assets: &SessionAssets,
  ) -> Result<(), EngineError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::from([root.uuid.clone()]);
    let mut pending = vec![root.clone()];

    while let Some(flow) = pending.pop() {
      if let Err(e) = flow.validate(assets) {
        errors.push(e);
      }
      for sub_flow in flow.sub_flows() {
        if seen.insert(sub_flow.uuid.clone()) {
          pending.push(assets.flow(&sub_flow.uuid).await?);
        }
      }
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(EngineError::Validation(errors))
    }
  }
}

/// What to do after visiting a node or finishing a run.
enum Visit {
  /// Carry on in the flow at the node, or finish the current run if none.
  Continue(Arc<Flow>, Option<String>),
  /// The session is waiting, completed or errored.
  Stopped,
}

/// One sprint's worth of execution over a borrowed session.
struct Sprinter<'a> {
  engine: &'a Engine,
  assets: &'a SessionAssets,
  session: &'a mut Session,
  sprint: Sprint,
  steps: usize,
}

impl<'a> Sprinter<'a> {
  fn new(
    engine: &'a Engine,
    assets: &'a SessionAssets,
    session: &'a mut Session,
    sprint: Sprint,
  ) -> Self {
    Self {
      engine,
      assets,
      session,
      sprint,
      steps: 0,
    }
  }

  async fn execute(&mut self, mut flow: Arc<Flow>, mut destination: Option<String>) {
    loop {
      let visit = match destination.take() {
        Some(node_uuid) => self.visit_node(&flow, &node_uuid).await,
        None => self.finish_run(RunStatus::Completed).await,
      };
      match visit {
        Visit::Continue(next_flow, next) => {
          flow = next_flow;
          destination = next;
        }
        Visit::Stopped => return,
      }
    }
  }

  async fn visit_node(&mut self, flow: &Arc<Flow>, node_uuid: &str) -> Visit {
    let Some(idx) = self.session.current_run_index() else {
      return Visit::Stopped;
    };

    self.steps += 1;
    if self.steps > self.engine.config.max_steps_per_sprint {
      let text = format!(
        "reached maximum number of steps per sprint ({})",
        self.engine.config.max_steps_per_sprint
      );
      self.fail(idx, text);
      return Visit::Stopped;
    }

    let Some(node) = flow.node(node_uuid) else {
      self.fail(idx, format!("unable to find node[uuid={}] in flow[uuid={}]", node_uuid, flow.uuid));
      return Visit::Stopped;
    };

    let now = self.engine.clock.now();
    let step_uuid = self.engine.uuids.next_string();
    self.session.runs[idx].create_step(step_uuid.clone(), node_uuid, now);
    debug!(run_uuid = %self.session.runs[idx].uuid, node_uuid, "node_visited");

    let mut fatal = None;
    let mut ctx = action_context(
      self.engine,
      self.assets,
      self.session,
      &mut self.sprint,
      idx,
      &node.uuid,
      &step_uuid,
    );
    for action in &node.actions {
      if let Err(err) = action.execute(&mut ctx).await {
        if err.is_fatal() {
          fatal = Some(err.to_string());
          break;
        }
        ctx.log_error(err.to_string());
      }
    }
    let flow_entry = ctx.flow_entry.take();
    drop(ctx);

    if let Some(text) = fatal {
      self.fail(idx, text);
      return Visit::Stopped;
    }
    if let Some(entry) = flow_entry {
      return self.enter_flow(idx, entry, &step_uuid).await;
    }
    if let Some(wait) = &node.wait {
      self.begin_wait(idx, flow, node, wait.as_ref(), &step_uuid);
      return Visit::Stopped;
    }

    let destination = self.route(idx, node, &step_uuid);
    Visit::Continue(flow.clone(), destination)
  }

  /// Push a child run for a sub-flow requested by an action.
  async fn enter_flow(&mut self, idx: usize, entry: FlowEntry, step_uuid: &str) -> Visit {
    let flow = match self.assets.flow(&entry.flow.uuid).await {
      Ok(flow) => flow,
      Err(e) => {
        self.fail(idx, e.to_string());
        return Visit::Stopped;
      }
    };

    let now = self.engine.clock.now();
    let current = &mut self.session.runs[idx];
    let current_uuid = current.uuid.clone();
    let parent_uuid = if entry.terminal {
      current.set_status(RunStatus::Completed, now);
      info!(run_uuid = %current.uuid, status = %current.status, "run_completed");
      current.parent_uuid.clone()
    } else {
      Some(current.uuid.clone())
    };

    let mut child = Run::new(
      self.engine.uuids.next_string(),
      flow.reference(),
      parent_uuid.clone(),
      now,
    );
    child.input = self.session.runs[idx].input.clone();
    if let Some(parent_idx) = parent_uuid.and_then(|u| self.session.run_index(&u)) {
      self.session.runs[parent_idx].child_uuid = Some(child.uuid.clone());
    }

    self.sprint.push_event(Box::new(FlowEnteredEvent {
      base: EventBase::new(now, Some(step_uuid.to_string())),
      flow: flow.reference(),
      parent_run_uuid: current_uuid,
      terminal: entry.terminal,
    }));
    self.session.runs.push(child);

    let destination = flow.entry().map(|n| n.uuid.clone());
    Visit::Continue(flow, destination)
  }

  fn begin_wait(&mut self, idx: usize, flow: &Flow, node: &Node, wait: &dyn Wait, step_uuid: &str) {
    let now = self.engine.clock.now();
    let base = EventBase::new(now, Some(step_uuid.to_string()));
    let event = wait.begin(base, self.session.contact.as_ref());
    self.sprint.push_event(event);

    let run = &mut self.session.runs[idx];
    run.set_status(RunStatus::Waiting, now);
    run.expires_on = flow
      .expire_after_minutes
      .map(|m| now + Duration::minutes(i64::from(m)));

    info!(
      run_uuid = %run.uuid,
      node_uuid = %node.uuid,
      wait_type = wait.type_name(),
      "session_waiting"
    );
    self.session.wait = Some(wait.clone_box());
    self.session.status = SessionStatus::Waiting;
  }

  /// Pick the exit to leave a node by and return its destination.
  fn route(&mut self, idx: usize, node: &Node, step_uuid: &str) -> Option<String> {
    let exit = match &node.router {
      Some(router) => {
        let mut ctx = action_context(
          self.engine,
          self.assets,
          self.session,
          &mut self.sprint,
          idx,
          &node.uuid,
          step_uuid,
        );
        pick_exit(&mut ctx, router, &node.exits)
      }
      None => node.exits.first(),
    }?;

    self.session.runs[idx].leave_step(&exit.uuid);
    exit.destination_node_uuid.clone()
  }

  /// End the current run and return to its parent, if it has one.
  async fn finish_run(&mut self, status: RunStatus) -> Visit {
    let Some(idx) = self.session.current_run_index() else {
      self.session.status = SessionStatus::Completed;
      return Visit::Stopped;
    };

    let now = self.engine.clock.now();
    let run = &mut self.session.runs[idx];
    run.set_status(status, now);
    info!(run_uuid = %run.uuid, flow_uuid = %run.flow.uuid, status = %status, "run_completed");

    let parent_idx = run
      .parent_uuid
      .clone()
      .and_then(|u| self.session.run_index(&u));
    let Some(parent_idx) = parent_idx else {
      self.session.status = SessionStatus::Completed;
      info!(session_uuid = %self.session.uuid, "session_completed");
      return Visit::Stopped;
    };

    let parent = &mut self.session.runs[parent_idx];
    parent.child_uuid = None;
    let flow_uuid = parent.flow.uuid.clone();
    let last_step = parent
      .last_step()
      .map(|s| (s.node_uuid.clone(), s.uuid.clone()));

    let flow = match self.assets.flow(&flow_uuid).await {
      Ok(flow) => flow,
      Err(e) => {
        self.fail(parent_idx, e.to_string());
        return Visit::Stopped;
      }
    };

    let destination = match last_step {
      Some((node_uuid, step_uuid)) => match flow.node(&node_uuid) {
        Some(node) => self.route(parent_idx, node, &step_uuid),
        None => None,
      },
      None => None,
    };
    Visit::Continue(flow, destination)
  }

  /// Log a fatal error and error the run, its ancestors and the session.
  fn fail(&mut self, idx: usize, text: String) {
    let now = self.engine.clock.now();
    let step_uuid = self.session.runs[idx].last_step().map(|s| s.uuid.clone());
    error!(
      session_uuid = %self.session.uuid,
      run_uuid = %self.session.runs[idx].uuid,
      error = %text,
      "session_failed"
    );
    self.sprint.push_event(Box::new(ErrorEvent {
      base: EventBase::new(now, step_uuid),
      text,
      fatal: true,
    }));

    let mut next = Some(idx);
    while let Some(i) = next {
      let run = &mut self.session.runs[i];
      run.set_status(RunStatus::Errored, now);
      let parent_uuid = run.parent_uuid.clone();
      next = parent_uuid.and_then(|u| self.session.run_index(&u));
    }

    self.session.wait = None;
    self.session.status = SessionStatus::Errored;
  }
}

/// Build the context actions and routers on a node execute with.
fn action_context<'b>(
  engine: &'b Engine,
  assets: &'b SessionAssets,
  session: &'b mut Session,
  sprint: &'b mut Sprint,
  idx: usize,
  node_uuid: &'b str,
  step_uuid: &'b str,
) -> ActionContext<'b> {
  let related = related_context(session, idx);
  let Session {
    environment,
    contact,
    runs,
    ..
  } = session;
  ActionContext {
    engine,
    assets,
    environment,
    contact,
    run: &mut runs[idx],
    related,
    node_uuid,
    step_uuid,
    sprint,
    flow_entry: None,
  }
}

/// Template view of the runs related to the run at `idx`, and the trigger.
fn related_context(session: &Session, idx: usize) -> Value {
  let run = &session.runs[idx];
  let mut related = Map::new();

  if let Some(parent) = run.parent_uuid.as_deref().and_then(|u| session.run(u)) {
    related.insert("parent".to_string(), parent.summary_context());
  }
  if let Some(child) = session
    .runs
    .iter()
    .rev()
    .find(|r| r.parent_uuid.as_deref() == Some(run.uuid.as_str()))
  {
    related.insert("child".to_string(), child.summary_context());
  }
  if let Some(trigger) = &session.trigger {
    related.insert("trigger".to_string(), trigger.context());
  }

  Value::Object(related)
}

/// Evaluate a switch router: the first case whose test matches picks the
/// category, otherwise the default category is used.
fn pick_exit<'n>(
  ctx: &mut ActionContext<'_>,
  router: &RouterDef,
  exits: &'n [ExitDef],
) -> Option<&'n ExitDef> {
  let RouterDef::Switch {
    operand,
    result_name,
    categories,
    cases,
    default_category_uuid,
  } = router;

  let operand = ctx.evaluate(operand);

  let mut matched = None;
  for case in cases {
    let Some(test) = switch::lookup(&case.test) else {
      continue;
    };
    let arguments: Vec<String> = case.arguments.iter().map(|a| ctx.evaluate(a)).collect();
    if let Some(value) = test(&operand, &arguments) {
      matched = Some((case.category_uuid.as_str(), value));
      break;
    }
  }

  let (category_uuid, value) = match matched {
    Some((category_uuid, value)) => (Some(category_uuid), value),
    None => (default_category_uuid.as_deref(), operand.clone()),
  };

  let Some(category) = category_uuid.and_then(|u| categories.iter().find(|c| c.uuid == u)) else {
    ctx.log_error("router didn't match any case and has no default category");
    return None;
  };

  if let Some(result_name) = result_name {
    ctx.save_result(result_name, &value, Some(&category.name), Some(&operand), None);
  }
  exits.iter().find(|e| e.uuid == category.exit_uuid)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builder_defaults() {
    let engine = Engine::builder().build();
    assert_eq!(engine.config().max_steps_per_sprint, DEFAULT_MAX_STEPS_PER_SPRINT);
    assert!(engine.registries().actions.contains("send_msg"));

    let engine = Engine::builder().with_max_steps_per_sprint(5).build();
    assert_eq!(engine.config().max_steps_per_sprint, 5);
  }

  #[test]
  fn test_new_session_is_unstarted() {
    let engine = Engine::builder().build();
    let session = engine.new_session(Environment::default(), None);
    assert!(session.runs.is_empty());
    assert_eq!(session.status, SessionStatus::Active);
    assert!(session.trigger.is_none());
  }
}
