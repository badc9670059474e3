/*
[INPUT]:  Aux bit toggles / mask writes, status snapshots, server-returned masks
[OUTPUT]: Owned aux mask state (confirmed + pending) and aux commands
[POS]:    Domain layer - virtual digital input control
[UPDATE]: When aux confirmation rules change
*/

use tracing::{debug, info};

use crate::codec;
use crate::http::{DeviceClient, LinkError, Result};
use crate::types::{AuxRequest, StatusSnapshot};

const AUX_BITS: u8 = 16;

/// Aux mask as the client knows it.
///
/// `confirmed` only changes from server data. `pending` holds a local value
/// that was accepted by the server without an echoed mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuxMaskState {
    pub confirmed: u16,
    pub pending: Option<u16>,
}

impl AuxMaskState {
    pub fn current(&self) -> u16 {
        self.pending.unwrap_or(self.confirmed)
    }

    /// `0x0008` style.
    pub fn display(&self) -> String {
        codec::format_hex16(i64::from(self.current()))
    }

    fn confirm(&mut self, mask: u16) {
        self.confirmed = mask;
        self.pending = None;
    }
}

/// Request that flips `bit` in `mask`.
pub fn toggle_request(mask: u16, bit: u8) -> Result<AuxRequest> {
    if bit >= AUX_BITS {
        return Err(LinkError::InvalidBit(bit));
    }
    Ok(AuxRequest::SetBit {
        bit,
        value: mask & (1u16 << bit) == 0,
    })
}

/// Owns the aux mask and sends every aux mutation.
#[derive(Debug, Clone)]
pub struct AuxMaskController {
    client: DeviceClient,
    state: AuxMaskState,
}

impl AuxMaskController {
    pub fn new(client: DeviceClient) -> Self {
        Self {
            client,
            state: AuxMaskState::default(),
        }
    }

    pub fn state(&self) -> AuxMaskState {
        self.state
    }

    pub fn display(&self) -> String {
        self.state.display()
    }

    /// Adopt the mask reported by a status snapshot.
    pub fn observe_snapshot(&mut self, snapshot: &StatusSnapshot) {
        self.observe_mask(snapshot.aux_mask);
    }

    /// Adopt a mask reported by any other server response.
    pub fn observe_mask(&mut self, mask: u16) {
        self.state.confirm(mask);
    }

    /// Flip one bit. The mask in the response, if any, becomes the
    /// confirmed value; on failure nothing changes.
    pub async fn toggle(&mut self, bit: u8) -> Result<AuxMaskState> {
        let request = toggle_request(self.state.current(), bit)?;
        let response = self.client.set_aux(request).await?;

        match response.mask() {
            Some(mask) => self.state.confirm(mask),
            None => debug!(bit, "aux toggle accepted without mask"),
        }
        info!(bit, aux = %self.state.display(), "aux bit toggled");
        Ok(self.state)
    }

    /// Write the whole mask.
    ///
    /// On success `pending` takes `mask` whatever the response says; a
    /// returned mask still updates `confirmed`.
    pub async fn set_mask(&mut self, mask: u16) -> Result<AuxMaskState> {
        let response = self.client.set_aux(AuxRequest::SetMask { mask }).await?;

        if let Some(confirmed) = response.mask() {
            self.state.confirmed = confirmed;
        }
        self.state.pending = Some(mask);
        info!(aux = %self.state.display(), "aux mask written");
        Ok(self.state)
    }

    pub async fn clear(&mut self) -> Result<AuxMaskState> {
        self.set_mask(0).await
    }
}
