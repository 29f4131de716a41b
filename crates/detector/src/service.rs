//! Background thread that owns a running controller.

use std::thread::JoinHandle;

use tokio_util::sync::CancellationToken;

use crate::controller::DetectionController;
use crate::error::{DetectorError, Result};
use crate::hardware::{DigitDisplay, SensorRig};
use crate::state::{CycleState, StateHandle};

/// Runs a [`DetectionController`] on its own thread until stopped.
pub struct DetectorService {
    cancel: CancellationToken,
    state: StateHandle,
    handle: Option<JoinHandle<Result<u64>>>,
}

impl DetectorService {
    /// Move `controller` onto a dedicated thread and start cycling.
    ///
    /// Stopping the service cancels the controller's own token.
    pub fn spawn<R, D>(mut controller: DetectionController<R, D>) -> Result<Self>
    where
        R: SensorRig + 'static,
        D: DigitDisplay + 'static,
    {
        let cancel = controller.cancellation_token();
        let state = controller.state_handle();

        let handle = std::thread::Builder::new()
            .name("quakelight-detector".to_string())
            .spawn(move || controller.run())
            .map_err(DetectorError::Spawn)?;

        tracing::info!("Detector service started");
        Ok(Self {
            cancel,
            state,
            handle: Some(handle),
        })
    }

    pub fn state(&self) -> CycleState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Request shutdown and wait for the controller to release its devices.
    ///
    /// Returns the number of completed cycles, or the error that ended the
    /// controller.
    pub fn stop(&mut self) -> Result<u64> {
        self.cancel.cancel();
        self.join_inner()
    }

    /// Wait for the controller to exit on its own (shutdown from elsewhere,
    /// or a hardware failure).
    pub fn join(mut self) -> Result<u64> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<u64> {
        let Some(handle) = self.handle.take() else {
            return Ok(0);
        };
        let result = handle.join().map_err(|_| DetectorError::WorkerPanicked)?;
        tracing::info!("Detector service stopped");
        result
    }
}

impl Drop for DetectorService {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                tracing::warn!(error = %e, "Detector stopped with error");
            }
        }
    }
}
