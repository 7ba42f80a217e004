//! The page a history table is painted on
//!
//! All page state lives in one task. Everything else talks to it through a
//! [`PageHandle`], so inputs are read and tables are swapped in one message at
//! a time and a half-built table is never observable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::config::PageConfig;
use crate::render::TableModel;
use crate::ViewerError;

/// Raw text of the page's inputs, as the user left them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInputs {
    /// Service selector, with or without the leading `#`
    pub selector: String,
    pub min_tick: String,
    pub max_tick: String,
}

/// A change the user makes to the page's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEdit {
    Selector(String),
    Range { min_tick: String, max_tick: String },
}

/// Whatever a table model ends up being painted on.
pub trait Display: Send + 'static {
    fn inputs(&self) -> PageInputs;

    fn edit(&mut self, edit: InputEdit);

    /// Replace the whole table, echo the queried range back into the inputs
    /// and make the table visible.
    fn apply(&mut self, model: TableModel);
}

/// In-memory page state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    pub inputs: PageInputs,
    pub service_name: String,
    pub table: Option<TableModel>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(config: &PageConfig) -> Self {
        Self {
            inputs: PageInputs {
                selector: config.service.clone(),
                min_tick: config.min_tick.to_string(),
                max_tick: config.max_tick.to_string(),
            },
            ..Self::default()
        }
    }

    /// The table stays hidden until the first successful apply.
    pub fn is_visible(&self) -> bool {
        self.table.is_some()
    }
}

impl Display for Page {
    fn inputs(&self) -> PageInputs {
        self.inputs.clone()
    }

    fn edit(&mut self, edit: InputEdit) {
        match edit {
            InputEdit::Selector(selector) => self.inputs.selector = selector,
            InputEdit::Range { min_tick, max_tick } => {
                self.inputs.min_tick = min_tick;
                self.inputs.max_tick = max_tick;
            }
        }
    }

    fn apply(&mut self, model: TableModel) {
        self.service_name = model.service_name.clone();
        self.inputs.min_tick = model.min_tick.to_string();
        self.inputs.max_tick = model.max_tick.to_string();
        self.table = Some(model);
        self.updated_at = Some(Utc::now());
    }
}

/// Result of handing a table to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied,
    /// A response to a later request has already been applied.
    Stale,
}

enum PageMessage<D> {
    Inputs {
        respond_to: oneshot::Sender<PageInputs>,
    },
    Edit {
        edit: InputEdit,
        respond_to: oneshot::Sender<()>,
    },
    Apply {
        sequence: u64,
        model: TableModel,
        respond_to: oneshot::Sender<ApplyOutcome>,
    },
    Inspect(Box<dyn FnOnce(&D) + Send>),
}

struct PageActor<D> {
    receiver: mpsc::UnboundedReceiver<PageMessage<D>>,
    display: D,
    last_applied: u64,
}

impl<D: Display> PageActor<D> {
    fn new(receiver: mpsc::UnboundedReceiver<PageMessage<D>>, display: D) -> Self {
        Self {
            receiver,
            display,
            last_applied: 0,
        }
    }

    fn handle_message(&mut self, msg: PageMessage<D>) {
        // Send errors mean the caller stopped waiting for the reply, which is
        // fine to ignore.
        match msg {
            PageMessage::Inputs { respond_to } => {
                let _ = respond_to.send(self.display.inputs());
            }
            PageMessage::Edit { edit, respond_to } => {
                self.display.edit(edit);
                let _ = respond_to.send(());
            }
            PageMessage::Apply {
                sequence,
                model,
                respond_to,
            } => {
                let outcome = if sequence < self.last_applied {
                    tracing::debug!(
                        "Dropping response #{} (#{} already applied)",
                        sequence,
                        self.last_applied
                    );
                    ApplyOutcome::Stale
                } else {
                    self.display.apply(model);
                    self.last_applied = sequence;
                    ApplyOutcome::Applied
                };
                let _ = respond_to.send(outcome);
            }
            PageMessage::Inspect(f) => f(&self.display),
        }
    }

    async fn run(&mut self) {
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }
        tracing::debug!("Page task stopped");
    }
}

/// Cloneable handle to the task owning a [`Display`].
pub struct PageHandle<D> {
    sender: mpsc::UnboundedSender<PageMessage<D>>,
}

impl<D> Clone for PageHandle<D> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<D: Display> PageHandle<D> {
    /// Move `display` into a new task. Must be called inside a tokio runtime.
    pub fn spawn(display: D) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut actor = PageActor::new(receiver, display);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    pub async fn inputs(&self) -> crate::Result<PageInputs> {
        self.request(|respond_to| PageMessage::Inputs { respond_to })
            .await
    }

    pub async fn edit(&self, edit: InputEdit) -> crate::Result<()> {
        self.request(|respond_to| PageMessage::Edit { edit, respond_to })
            .await
    }

    /// Apply the model rendered for request number `sequence`, unless a later
    /// request's model is already on the page.
    pub async fn apply(&self, sequence: u64, model: TableModel) -> crate::Result<ApplyOutcome> {
        self.request(|respond_to| PageMessage::Apply {
            sequence,
            model,
            respond_to,
        })
        .await
    }

    /// Run `f` against the current display state.
    pub async fn inspect<R, F>(&self, f: F) -> crate::Result<R>
    where
        F: FnOnce(&D) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.request(|respond_to| {
            PageMessage::Inspect(Box::new(move |display: &D| {
                let _ = respond_to.send(f(display));
            }))
        })
        .await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> PageMessage<D>,
    ) -> crate::Result<T> {
        let (send, recv) = oneshot::channel();
        // If this send fails, so does the recv below.
        let _ = self.sender.send(make(send));
        recv.await.map_err(|_| ViewerError::PageClosed)
    }
}
