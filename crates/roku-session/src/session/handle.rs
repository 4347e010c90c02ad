// Copyright 2025 Tim Roberts
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Task-driven session.
//!
//! [`Session::spawn`] moves a [`SessionController`] into a background task
//! and feeds it commands over a channel, one at a time. Callers await the
//! outcome of each command; observers follow the watch channel.

use log::debug;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::{SelectionSource, SessionController, ViewState};
use crate::device::Device;
use crate::http::DeviceInfoClient;
use crate::store::PreferenceStore;

const COMMAND_BUFFER: usize = 16;

/// The session task has stopped and no longer accepts commands.
#[derive(Debug, Error)]
#[error("session task has stopped")]
pub struct SessionClosed;

#[derive(Debug)]
enum SessionCommand {
    ReconnectLastDevice {
        reply: oneshot::Sender<ViewState>,
    },
    SelectDevice {
        device: Device,
        source: SelectionSource,
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a session running in a background task.
///
/// Dropping the handle stops the task.
pub struct Session {
    command_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<ViewState>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state_rx.borrow())
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Spawn the session task. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn<C, S>(controller: SessionController<C, S>) -> Self
    where
        C: DeviceInfoClient + 'static,
        S: PreferenceStore + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let state_rx = controller.subscribe();
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        tokio::spawn(async move {
            session_loop(controller, command_rx, task_cancel).await;
        });

        Self {
            command_tx,
            state_rx,
            cancel_token,
        }
    }

    /// Run a reconnect attempt and wait for its final state.
    pub async fn reconnect_last_device(&self) -> Result<ViewState, SessionClosed> {
        let (reply, done) = oneshot::channel();
        self.send(SessionCommand::ReconnectLastDevice { reply })
            .await?;
        done.await.map_err(|_recv_error| SessionClosed)
    }

    /// Select a device and wait until the selection is published.
    pub async fn select_device(
        &self,
        device: Device,
        source: SelectionSource,
    ) -> Result<(), SessionClosed> {
        let (reply, done) = oneshot::channel();
        self.send(SessionCommand::SelectDevice {
            device,
            source,
            reply,
        })
        .await?;
        done.await.map_err(|_recv_error| SessionClosed)
    }

    /// Subscribe to state changes (last-value delivery).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Most recently published state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    /// Stop the session task. Commands already running finish first.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        if self.cancel_token.is_cancelled() || self.command_tx.send(command).await.is_err() {
            return Err(SessionClosed);
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn session_loop<C, S>(
    mut controller: SessionController<C, S>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    cancel_token: CancellationToken,
) where
    C: DeviceInfoClient,
    S: PreferenceStore,
{
    loop {
        let command = tokio::select! {
            biased;
            () = cancel_token.cancelled() => {
                debug!("Session cancelled");
                return;
            }
            command = command_rx.recv() => match command {
                Some(command) => command,
                None => {
                    debug!("Session handle dropped");
                    return;
                }
            },
        };

        match command {
            SessionCommand::ReconnectLastDevice { reply } => {
                let state = controller.reconnect_last_device().await;
                let _ = reply.send(state);
            }
            SessionCommand::SelectDevice {
                device,
                source,
                reply,
            } => {
                controller.select_device(device, source);
                let _ = reply.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestError;
    use crate::protocol::DeviceInfo;
    use crate::store::{MemoryStore, PREVIOUS_LOCATION_KEY, PREVIOUS_NAME_KEY};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers as "Living Room" and counts requests.
    #[derive(Debug, Default, Clone)]
    struct LivingRoom {
        requests: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DeviceInfoClient for LivingRoom {
        async fn device_info(&self, _location: &str) -> Result<DeviceInfo, RequestError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            Ok(DeviceInfo {
                friendly_device_name: "Living Room".to_string(),
                device_id: "ABC123".to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_spawned_session_reconnects() {
        let store = Arc::new(MemoryStore::with_entries([
            (PREVIOUS_LOCATION_KEY, "http://192.0.2.10"),
            (PREVIOUS_NAME_KEY, "Living Room"),
        ]));
        let client = LivingRoom::default();
        let session = Session::spawn(SessionController::new(client.clone(), Arc::clone(&store)));
        assert_eq!(session.state(), ViewState::Initializing);

        let state = session.reconnect_last_device().await.unwrap();

        let device = Device::new("http://192.0.2.10", "Living Room", "ABC123");
        assert_eq!(state, ViewState::DeviceReconnected(device));
        assert_eq!(session.state(), state);
        assert_eq!(client.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_commands_run_in_order() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::spawn(SessionController::new(LivingRoom::default(), Arc::clone(&store)));
        let mut rx = session.subscribe();

        let device = Device::new("http://192.0.2.10", "Living Room", "ABC123");
        session
            .select_device(device.clone(), SelectionSource::User)
            .await
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), ViewState::DeviceSelected(device.clone()));

        // The selection was remembered, so the reconnect finds it.
        let state = session.reconnect_last_device().await.unwrap();
        assert_eq!(state, ViewState::DeviceReconnected(device));
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_further_commands() {
        let session = Session::spawn(SessionController::new(
            LivingRoom::default(),
            MemoryStore::new(),
        ));
        session.shutdown();

        assert!(session.reconnect_last_device().await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_session_closes_state_channel() {
        let session = Session::spawn(SessionController::new(
            LivingRoom::default(),
            MemoryStore::new(),
        ));
        let mut rx = session.subscribe();
        drop(session);

        // The task drops the controller, and with it the sender.
        assert!(rx.changed().await.is_err());
    }
}
