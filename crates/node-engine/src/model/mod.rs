mod event;
mod flow;
mod registry;

pub use event::{FlowEvent, LogItem, LogLevel};
pub use flow::{
    Context, FlowComponent, FlowDefinition, FlowStatus, FlowStep, TraceComponentRef, TraceEntry,
    EXIT_KEY,
};
pub use registry::{
    ComponentRegistration, RegistrationConfig, RegistrationSummary, RegistrationType,
};
