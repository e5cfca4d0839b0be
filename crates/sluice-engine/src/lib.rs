//! Sluice Engine
//!
//! This crate runs flows for contacts. A [`Session`] is started from a
//! [`Trigger`] and executes node by node until it completes, errors, or
//! reaches a [`Wait`]; a waiting session is continued with a [`Resume`].
//! Every call returns a [`Sprint`]: the events and modifiers it produced.
//!
//! Actions, events, modifiers, triggers, resumes and waits are open
//! families, decoded by type tag through the [`Registries`] an [`Engine`]
//! owns. Custom variants are added with [`EngineBuilder`].
//!
//! Time and identity come from an injectable [`Clock`] and
//! [`UuidGenerator`], so a session replays identically under test with a
//! [`FixedClock`] and [`SeededGenerator`].

mod actions;
mod assets;
mod channels;
mod contact;
mod context;
mod engine;
mod error;
mod events;
mod flow;
mod generators;
mod input;
mod inspect;
mod modifiers;
pub mod registry;
mod results;
mod resumes;
mod run;
mod services;
mod session;
mod switch;
mod template;
mod triggers;
mod urn;
mod waits;

pub use actions::{
  Action, AddToGroupAction, CallClassifierAction, EnterFlowAction, RemoveFromGroupAction,
  SendMsgAction, SetContactFieldAction, SetContactLanguageAction, SetContactNameAction,
  SetRunResultAction,
};
pub use assets::SessionAssets;
pub use channels::ChannelAssets;
pub use contact::{Contact, FieldValue};
pub use context::ActionContext;
pub use engine::{DEFAULT_MAX_STEPS_PER_SPRINT, Engine, EngineBuilder, EngineConfig};
pub use error::{
  ActionError, DecodeError, EngineError, FlowError, ServiceError, UrnError, ValidationError,
};
pub use events::{
  ClassifierCalledEvent, ContactFieldChangedEvent, ContactGroupsChangedEvent, DialEndedEvent,
  DialWaitEvent, ErrorEvent, Event, EventBase, FlowEnteredEvent, MsgCreatedEvent,
  MsgReceivedEvent, MsgWaitEvent, NothingWaitEvent, RunExpiredEvent, RunResultChangedEvent,
  UpdateContactEvent,
};
pub use flow::{ExtractedReference, Flow, Node};
pub use generators::{Clock, FixedClock, SeededGenerator, SystemClock, UuidGenerator, V4Generator};
pub use input::{Dial, DialStatus, Input, MsgIn, MsgOut};
pub use inspect::{ISSUE_MISSING_DEPENDENCY, Issue, check_dependencies};
pub use modifiers::{
  FieldModifier, GroupsModification, GroupsModifier, LanguageModifier, Modifier, NameModifier,
};
pub use registry::{Constructor, Registries, Registry, Typed, tagged_json};
pub use results::{
  CATEGORY_FAILURE, CATEGORY_SKIPPED, CATEGORY_SUCCESS, ResultInfo, RunResult, merge_result_infos,
  result_key,
};
pub use resumes::{DialResume, MsgResume, Resume, RunExpirationResume};
pub use run::{Run, RunStatus, Step};
pub use services::{
  CallStatus, Classification, ClassificationFactory, ClassificationService, ExtractedEntity,
  ExtractedIntent, HttpLog, HttpLogger, Services,
};
pub use session::{Session, SessionStatus, Sprint};
pub use switch::{CaseTest, lookup as lookup_case_test};
pub use template::{MiniJinjaEvaluator, TemplateEvaluator, is_template};
pub use triggers::{
  CampaignEvent, CampaignReference, CampaignTrigger, FlowActionTrigger, KeywordMatch,
  KeywordMatchType, ManualTrigger, MsgTrigger, Trigger,
};
pub use urn::{TEL_SCHEME, Urn};
pub use waits::{DialWait, MsgWait, NothingWait, Wait};
