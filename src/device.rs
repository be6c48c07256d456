//! Device (display) pairing, liveness and heartbeat.
//!
//! A paired display authenticates with a long-lived device token and has no
//! refresh path. A 401 from the device-info endpoint therefore means the
//! pairing itself was revoked: the client clears every credential and
//! reports the lost session instead of retrying.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::StaysignClient;
use crate::config::endpoints;
use crate::error::Result;
use crate::models::{DeviceInfo, DevicePairing, DeviceRegistration, HeartbeatPayload};
use crate::transport::RequestDescriptor;

impl StaysignClient {
    /// Pair this display using a pairing code, storing the device token.
    pub async fn register_device(&self, registration: &DeviceRegistration) -> Result<DevicePairing> {
        let req = RequestDescriptor::post(endpoints::DEVICE_REGISTER)
            .json(registration)
            .no_auth()
            .skip_token_refresh();
        let pairing: DevicePairing = self.request(req).await?;
        self.set_device_token(Some(pairing.device_token.clone()));
        info!("Device paired");
        Ok(pairing)
    }

    /// Fetch this display's profile with the device credential.
    ///
    /// Never refreshed. On 401 all credentials are cleared before the
    /// device-session-invalid notification (or recovery strategy) runs, and
    /// the error is returned.
    pub async fn get_device_info(&self) -> Result<DeviceInfo> {
        let req = RequestDescriptor::get(endpoints::DEVICE_INFO)
            .device_auth()
            .skip_token_refresh();

        match self.request(req).await {
            Ok(info) => Ok(info),
            Err(e) if e.is_unauthorized() => {
                self.inner.invalidate_device_session();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Report that this display is alive.
    pub async fn send_heartbeat(&self, payload: &HeartbeatPayload) -> Result<()> {
        let req = RequestDescriptor::post(endpoints::DEVICE_HEARTBEAT)
            .json(payload)
            .device_auth();
        self.request_value(req).await?;
        Ok(())
    }

    /// Send heartbeats on a fixed interval. The first beat goes out
    /// immediately.
    ///
    /// The task runs until one of:
    /// - [`HeartbeatHandle::stop`] is called;
    /// - the handle is dropped, so keep it alive for as long as beats should
    ///   go out (`let _ = client.start_heartbeat(..)` stops at once);
    /// - the device session is rejected. A failed beat is followed by a
    ///   [`get_device_info`](Self::get_device_info) check, and a 401 there
    ///   clears the credentials and ends the task, which
    ///   [`HeartbeatHandle::is_running`] then reports.
    ///
    /// `interval` defaults to the configured heartbeat interval, as does a
    /// zero interval.
    #[must_use = "the heartbeat stops when the handle is dropped"]
    pub fn start_heartbeat(
        &self,
        interval: Option<Duration>,
        payload: HeartbeatPayload,
    ) -> HeartbeatHandle {
        let period = interval
            .filter(|d| !d.is_zero())
            .unwrap_or(self.inner.config.heartbeat_interval);
        let client = self.clone();

        info!(interval_secs = period.as_secs_f64(), "Starting device heartbeat");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !client.heartbeat_cycle(&payload).await {
                    info!("Device session ended; heartbeat stopped");
                    break;
                }
            }
        });

        HeartbeatHandle { task: Some(task) }
    }

    /// One heartbeat. On failure, check liveness through `get_device_info`,
    /// which owns the 401 recovery. Anything else is logged and dropped.
    ///
    /// Returns false once the device session is gone.
    async fn heartbeat_cycle(&self, payload: &HeartbeatPayload) -> bool {
        let Err(e) = self.send_heartbeat(payload).await else {
            debug!("Heartbeat sent");
            return true;
        };

        warn!(error = %e, "Heartbeat failed; checking device session");
        match self.get_device_info().await {
            Ok(_) => {
                debug!("Device session still valid");
                true
            }
            Err(e) if e.is_unauthorized() => false,
            Err(e) => {
                debug!(error = %e, "Liveness check failed; will retry next beat");
                true
            }
        }
    }
}

/// Stop handle for a running heartbeat. Dropping it also stops the task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Stop sending heartbeats. A beat already in progress is abandoned.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Device heartbeat stopped");
        }
    }

    /// True until [`stop`](Self::stop) is called or the task ends.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
