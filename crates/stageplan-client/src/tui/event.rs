use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, KeyEvent, MouseEvent};

use crate::api_client::ApiClient;
use crate::error::{Result, StageplanError};
use crate::timeline::Completion;

/// Everything the event loop reacts to
#[derive(Debug)]
pub enum Event {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse press, drag, release and wheel
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// The terminal lost focus; any pointer capture is gone
    FocusLost,
    /// Periodic tick for UI updates
    Tick,
    /// A backend job finished
    Completed(Completion),
    /// The server reported that stored items changed
    DataChanged,
}

/// Event handler with background thread
pub struct EventHandler {
    sender: mpsc::Sender<Event>,
    receiver: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Create a new event handler with the given tick rate in milliseconds
    pub fn new(tick_rate: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate);
        let (sender, receiver) = mpsc::channel();

        let input = sender.clone();
        thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let forwarded = match event::read() {
                    Ok(event::Event::Key(key)) => Some(Event::Key(key)),
                    Ok(event::Event::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                    Ok(event::Event::Resize(width, height)) => Some(Event::Resize(width, height)),
                    Ok(event::Event::FocusLost) => Some(Event::FocusLost),
                    _ => None,
                };
                if let Some(event) = forwarded {
                    if input.send(event).is_err() {
                        break;
                    }
                }
            } else if input.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { sender, receiver }
    }

    /// Also listen for server-sent change notifications. The listener
    /// reconnects with a fixed backoff until the event loop goes away.
    pub fn with_server_events(self, client: ApiClient) -> Self {
        let sender = self.sender.clone();
        thread::spawn(move || loop {
            let result = client.listen_events(|| sender.send(Event::DataChanged).is_ok());
            match result {
                Ok(()) => tracing::info!("event stream closed, reconnecting"),
                Err(e) => tracing::warn!(error = %e, "event stream failed, reconnecting"),
            }
            // Probe the channel so the thread exits with the app.
            if sender.send(Event::Tick).is_err() {
                break;
            }
            thread::sleep(Duration::from_secs(5));
        });
        self
    }

    /// Sender for worker threads posting results back
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.sender.clone()
    }

    /// Get the next event, blocking until one is available
    pub fn next(&self) -> Result<Event> {
        self.receiver
            .recv()
            .map_err(|e| StageplanError::Tui(e.to_string()))
    }
}
