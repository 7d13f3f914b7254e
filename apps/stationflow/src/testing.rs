//! Test doubles shared by unit tests.

use crate::client::AutosaveRequest;
use crate::error::ClientError;
use crate::progress::{ProgressScope, RemoteProgress};
use stationflow_core::{ProgressSnapshot, Submission};
use std::sync::Mutex;

/// In-memory remote that records calls; fails everything when `offline`.
#[derive(Default)]
pub struct FakeRemote {
    pub offline: bool,
    pub stored: Mutex<Option<ProgressSnapshot>>,
    pub saves: Mutex<Vec<ProgressSnapshot>>,
    pub autosaves: Mutex<Vec<AutosaveRequest>>,
    pub submissions: Mutex<Vec<Submission>>,
}

impl FakeRemote {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.offline {
            Err(ClientError::ConnectionFailed("offline".into()))
        } else {
            Ok(())
        }
    }
}

impl RemoteProgress for FakeRemote {
    async fn load(&self, _: &ProgressScope) -> Result<Option<ProgressSnapshot>, ClientError> {
        self.check()?;
        Ok(self.stored.lock().expect("lock").clone())
    }

    async fn save(&self, _: &ProgressScope, s: &ProgressSnapshot) -> Result<(), ClientError> {
        self.check()?;
        self.saves.lock().expect("lock").push(s.clone());
        *self.stored.lock().expect("lock") = Some(s.clone());
        Ok(())
    }

    async fn autosave(&self, _: &ProgressScope, b: &AutosaveRequest) -> Result<(), ClientError> {
        self.check()?;
        self.autosaves.lock().expect("lock").push(b.clone());
        Ok(())
    }

    async fn submit(&self, _: &ProgressScope, s: &Submission) -> Result<(), ClientError> {
        self.check()?;
        self.submissions.lock().expect("lock").push(s.clone());
        Ok(())
    }
}
