use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::interaction::{Interaction, InteractionData};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitKind {
    Component,
    Modal,
}

struct PendingWait {
    token: Uuid,
    sender: oneshot::Sender<Interaction>,
}

/// Removes its own wait on drop, a newer wait might've taken the key since.
struct Listener<'a> {
    pending: &'a Mutex<HashMap<(WaitKind, String), PendingWait>>,
    key: (WaitKind, String),
    token: Uuid,
}

impl Drop for Listener<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock();
        if pending
            .get(&self.key)
            .is_some_and(|wait| wait.token == self.token)
        {
            pending.remove(&self.key);
        }
    }
}

/// Hands component clicks and modal submits to whoever is waiting for them,
/// keyed by `custom_id`.
#[derive(Clone, Default)]
pub struct Waiter {
    pending: Arc<Mutex<HashMap<(WaitKind, String), PendingWait>>>,
}

impl Waiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for one interaction of `kind` with `custom_id`, `None` on timeout.
    /// The listener is removed again on return and when the future is dropped.
    pub async fn wait(
        &self,
        kind: WaitKind,
        custom_id: &str,
        timeout: Duration,
    ) -> Option<Interaction> {
        let key = (kind, custom_id.to_string());
        let token = Uuid::now_v7();
        let (sender, receiver) = oneshot::channel();

        if self
            .pending
            .lock()
            .insert(key.clone(), PendingWait { token, sender })
            .is_some()
        {
            tracing::debug!(custom_id, "replaced an existing wait");
        }

        let _listener = Listener {
            pending: &self.pending,
            key,
            token,
        };
        let result = tokio::time::timeout(timeout, receiver).await;

        match result {
            Ok(Ok(interaction)) => Some(interaction),
            Ok(Err(_)) => None,
            Err(_) => {
                tracing::debug!(custom_id, ?kind, "wait timed out");
                None
            }
        }
    }

    /// Give `interaction` to a matching wait, returns whether anyone took it.
    pub fn resolve(&self, interaction: &Interaction) -> bool {
        let key = match &interaction.data {
            InteractionData::Component(component) => {
                (WaitKind::Component, component.custom_id.clone())
            }
            InteractionData::Modal(modal) => (WaitKind::Modal, modal.custom_id.clone()),
            _ => return false,
        };

        let Some(wait) = self.pending.lock().remove(&key) else {
            return false;
        };

        wait.sender.send(interaction.clone()).is_ok()
    }

    pub fn is_pending(&self, kind: WaitKind, custom_id: &str) -> bool {
        self.pending
            .lock()
            .contains_key(&(kind, custom_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
