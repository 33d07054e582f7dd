use gol_wire::Event;

/// Abstract boundary to the UI collaborator. The client controller only
/// ever pushes tagged [`Event`]s through this trait, so a richer
/// visualiser can be swapped in without touching the FSM.
pub trait EventSink: Send {
    fn emit(&mut self, event: Event);
}

/// Default sink: structured log lines in place of a real visualiser.
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&mut self, event: Event) {
        log::info!("{}", event.to_json());
    }
}
