//! Consumer-control HID model for the BLE media remote.
//!
//! The device exposes a single 2-byte input report (report ID 1). Byte 0
//! carries one-hot flags for seven consumer usages, byte 1 is reserved and
//! always zero. A key press is always sent as a press report followed
//! immediately by an all-zero release report.
//!
//! Transport is abstracted behind [`ReportNotifier`] so the press/release
//! sequencing can be exercised without a radio. The UI never talks to the
//! radio directly: it pushes [`MediaKey`]s through a [`MediaKeySink`], which
//! on the device is the static [`MEDIA_KEY_CHANNEL`].

use core::future::Future;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use log::{debug, warn};

// =============================================================================
// GATT constants
// =============================================================================

/// Human Interface Device service.
pub const HID_SERVICE_UUID: u16 = 0x1812;

/// Generic HID appearance advertised as "keyboard".
pub const APPEARANCE_KEYBOARD: u16 = 0x03C1;

/// Report ID shared by the input and output reports.
pub const REPORT_ID: u8 = 1;

/// Report Reference descriptor value for the input report.
pub const INPUT_REPORT_REFERENCE: [u8; 2] = [REPORT_ID, 0x01];

/// Report Reference descriptor value for the output report.
pub const OUTPUT_REPORT_REFERENCE: [u8; 2] = [REPORT_ID, 0x02];

/// HID Information: bcdHID 1.11, country code 0, flags 0x01 (remote wake).
pub const HID_INFORMATION: [u8; 4] = [0x11, 0x01, 0x00, 0x01];

/// PnP ID: vendor ID source, vendor ID, product ID and product version.
pub const PNP_ID: PnpId = PnpId {
    vendor_id_source: 0x02,
    vendor_id: 0xe502,
    product_id: 0xa111,
    product_version: 0x0210,
};

/// Report protocol mode (the only mode this device implements).
pub const PROTOCOL_MODE_REPORT: u8 = 0x01;

/// Consumer-control report descriptor: 7 one-bit usages plus 1 padding bit.
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 39] = [
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x07, //   Report Count (7)
    0x09, 0xB5, //   Usage (Scan Next Track)
    0x09, 0xB6, //   Usage (Scan Previous Track)
    0x09, 0xB7, //   Usage (Stop)
    0x09, 0xCD, //   Usage (Play/Pause)
    0x09, 0xE2, //   Usage (Mute)
    0x09, 0xE9, //   Usage (Volume Increment)
    0x09, 0xEA, //   Usage (Volume Decrement)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x01, //   Input (Const)
    0xC0,       // End Collection
];

/// Device Information PnP ID characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnpId {
    pub vendor_id_source: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product_version: u16,
}

impl PnpId {
    /// Little-endian wire encoding (7 bytes).
    pub const fn to_bytes(&self) -> [u8; 7] {
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let ver = self.product_version.to_le_bytes();
        [
            self.vendor_id_source,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            ver[0],
            ver[1],
        ]
    }
}

// =============================================================================
// Keys and reports
// =============================================================================

/// One of the seven consumer usages declared in [`REPORT_MAP`].
///
/// The discriminant is the bit flag carried in byte 0 of the input report,
/// in descriptor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MediaKey {
    NextTrack = 1 << 0,
    PreviousTrack = 1 << 1,
    Stop = 1 << 2,
    PlayPause = 1 << 3,
    Mute = 1 << 4,
    VolumeUp = 1 << 5,
    VolumeDown = 1 << 6,
}

impl MediaKey {
    pub const ALL: [MediaKey; 7] = [
        MediaKey::NextTrack,
        MediaKey::PreviousTrack,
        MediaKey::Stop,
        MediaKey::PlayPause,
        MediaKey::Mute,
        MediaKey::VolumeUp,
        MediaKey::VolumeDown,
    ];

    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Map a raw flag byte back to a key. Only single-bit values are keys.
    #[cfg(test)]
    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.bits() == bits)
    }

    /// HID consumer usage ID for this key.
    pub const fn usage(self) -> u16 {
        match self {
            MediaKey::NextTrack => 0x00B5,
            MediaKey::PreviousTrack => 0x00B6,
            MediaKey::Stop => 0x00B7,
            MediaKey::PlayPause => 0x00CD,
            MediaKey::Mute => 0x00E2,
            MediaKey::VolumeUp => 0x00E9,
            MediaKey::VolumeDown => 0x00EA,
        }
    }
}

/// The 2-byte input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaKeyReport {
    pub keys: u8,
    pub reserved: u8,
}

impl MediaKeyReport {
    pub const SIZE: usize = 2;

    pub const fn pressed(key: MediaKey) -> Self {
        Self {
            keys: key.bits(),
            reserved: 0,
        }
    }

    pub const fn released() -> Self {
        Self {
            keys: 0,
            reserved: 0,
        }
    }

    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.keys, self.reserved]
    }
}

// =============================================================================
// Transport seam
// =============================================================================

/// Pushes an input report value to subscribed centrals.
///
/// Implementations must treat "nobody subscribed" as success.
pub trait ReportNotifier {
    type Error: core::fmt::Debug;

    fn notify(&mut self, report: [u8; MediaKeyReport::SIZE])
    -> impl Future<Output = Result<(), Self::Error>>;
}

/// Sends press/release pairs over a [`ReportNotifier`].
pub struct MediaController<N: ReportNotifier> {
    notifier: N,
}

impl<N: ReportNotifier> MediaController<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Send `key` as a press report followed by a release report.
    ///
    /// There is no hold time and no debouncing; every call produces its own
    /// pair. Notify failures are logged and swallowed, and a failed press
    /// still sends the release.
    pub async fn send_media_key_press(&mut self, key: MediaKey) {
        debug!(" Sending media key {:?}", key);

        if let Err(e) = self
            .notifier
            .notify(MediaKeyReport::pressed(key).to_bytes())
            .await
        {
            warn!("Press report for {:?} not delivered: {:?}", key, e);
        }

        if let Err(e) = self
            .notifier
            .notify(MediaKeyReport::released().to_bytes())
            .await
        {
            warn!("Release report for {:?} not delivered: {:?}", key, e);
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn into_inner(self) -> N {
        self.notifier
    }
}

// =============================================================================
// Link state
// =============================================================================

/// Advertiser lifecycle, as seen from outside the BLE task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Uninitialized,
    Advertising,
    Connected,
}

/// Connection snapshot shared between the BLE task and the UI.
///
/// Only the BLE task writes it; everyone else reads snapshots.
pub struct HidLink {
    state: AtomicU8,
    connections: AtomicU8,
}

impl HidLink {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
            connections: AtomicU8::new(0),
        }
    }

    pub fn state(&self) -> LinkState {
        match self.state.load(Ordering::Acquire) {
            0 => LinkState::Uninitialized,
            1 => LinkState::Advertising,
            _ => LinkState::Connected,
        }
    }

    /// True iff at least one central is connected.
    pub fn is_connected(&self) -> bool {
        self.connections.load(Ordering::Acquire) > 0
    }

    pub fn connection_count(&self) -> u8 {
        self.connections.load(Ordering::Acquire)
    }

    /// The stack finished setup and started advertising.
    pub fn advertising_started(&self) {
        if self.state() == LinkState::Uninitialized {
            self.state.store(1, Ordering::Release);
        }
    }

    pub fn connected(&self) {
        self.connections.fetch_add(1, Ordering::AcqRel);
        self.state.store(2, Ordering::Release);
    }

    /// A central dropped; fall back to advertising once none remain.
    pub fn disconnected(&self) {
        let previous = self
            .connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        if previous <= 1 {
            self.state.store(1, Ordering::Release);
        }
    }
}

impl Default for HidLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Connection snapshot of the device's one HID advertiser.
pub static HID_LINK: HidLink = HidLink::new();

// =============================================================================
// UI -> BLE key channel
// =============================================================================

pub const MEDIA_KEY_CHANNEL_CAPACITY: usize = 8;

/// Key presses queued by the UI for the BLE task.
pub static MEDIA_KEY_CHANNEL: Channel<
    CriticalSectionRawMutex,
    MediaKey,
    MEDIA_KEY_CHANNEL_CAPACITY,
> = Channel::new();

/// Outbound seam from the UI to the HID sender.
pub trait MediaKeySink {
    /// Queue a key press. Must not block the UI loop.
    fn send_key(&mut self, key: MediaKey);
}

impl<const N: usize> MediaKeySink for Sender<'_, CriticalSectionRawMutex, MediaKey, N> {
    fn send_key(&mut self, key: MediaKey) {
        if self.try_send(key).is_err() {
            warn!("Media key queue full, dropping {:?}", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    /// Records every report it is asked to notify.
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Vec<[u8; 2]>,
        fail_press: bool,
    }

    impl ReportNotifier for RecordingNotifier {
        type Error = &'static str;

        async fn notify(&mut self, report: [u8; 2]) -> Result<(), Self::Error> {
            if self.fail_press && report[0] != 0 {
                return Err("not subscribed");
            }
            self.sent.push(report);
            Ok(())
        }
    }

    #[test]
    fn test_every_key_sends_press_then_release() {
        for key in MediaKey::ALL {
            let mut controller = MediaController::new(RecordingNotifier::default());
            block_on(controller.send_media_key_press(key));

            let sent = &controller.notifier().sent;
            assert_eq!(sent.len(), 2, "key {:?}", key);
            assert_eq!(sent[0], [key.bits(), 0]);
            assert_eq!(sent[1], [0, 0]);
        }
    }

    #[test]
    fn test_repeated_presses_are_independent_pairs() {
        let mut controller = MediaController::new(RecordingNotifier::default());
        block_on(async {
            controller.send_media_key_press(MediaKey::VolumeUp).await;
            controller.send_media_key_press(MediaKey::VolumeUp).await;
        });

        let sent = controller.into_inner().sent;
        assert_eq!(sent, [[0x20, 0], [0, 0], [0x20, 0], [0, 0]]);
    }

    #[test]
    fn test_failed_press_still_releases() {
        let mut controller = MediaController::new(RecordingNotifier {
            fail_press: true,
            ..Default::default()
        });
        block_on(controller.send_media_key_press(MediaKey::Mute));

        assert_eq!(controller.notifier().sent, [[0, 0]]);
    }

    #[test]
    fn test_key_bits_follow_descriptor_order() {
        assert_eq!(MediaKey::NextTrack.bits(), 0x01);
        assert_eq!(MediaKey::PreviousTrack.bits(), 0x02);
        assert_eq!(MediaKey::Stop.bits(), 0x04);
        assert_eq!(MediaKey::PlayPause.bits(), 0x08);
        assert_eq!(MediaKey::Mute.bits(), 0x10);
        assert_eq!(MediaKey::VolumeUp.bits(), 0x20);
        assert_eq!(MediaKey::VolumeDown.bits(), 0x40);

        // Usages appear in the report map in the same order as the bits
        let usages: Vec<u8> = REPORT_MAP
            .windows(2)
            .filter(|w| w[0] == 0x09 && w[1] > 0x01)
            .map(|w| w[1])
            .collect();
        let expected: Vec<u8> = MediaKey::ALL.iter().map(|k| k.usage() as u8).collect();
        assert_eq!(usages, expected);
    }

    #[test]
    fn test_from_bits_rejects_combinations() {
        assert_eq!(MediaKey::from_bits(0x08), Some(MediaKey::PlayPause));
        assert_eq!(MediaKey::from_bits(0x00), None);
        assert_eq!(MediaKey::from_bits(0x03), None);
        assert_eq!(MediaKey::from_bits(0x80), None);
    }

    #[test]
    fn test_report_map_declares_eight_bits() {
        // 7 data bits + 1 constant padding bit fits the first report byte
        assert_eq!(REPORT_MAP[0..2], [0x05, 0x0C]);
        assert_eq!(REPORT_MAP[6..8], [0x85, REPORT_ID]);
        assert_eq!(REPORT_MAP[14..16], [0x95, 0x07]);
        assert_eq!(*REPORT_MAP.last().unwrap(), 0xC0);
    }

    #[test]
    fn test_pnp_id_encoding() {
        assert_eq!(PNP_ID.to_bytes(), [0x02, 0x02, 0xe5, 0x11, 0xa1, 0x10, 0x02]);
    }

    #[test]
    fn test_link_state_transitions() {
        let link = HidLink::new();
        assert_eq!(link.state(), LinkState::Uninitialized);
        assert!(!link.is_connected());

        link.advertising_started();
        assert_eq!(link.state(), LinkState::Advertising);

        link.connected();
        assert_eq!(link.state(), LinkState::Connected);
        assert!(link.is_connected());

        link.disconnected();
        assert_eq!(link.state(), LinkState::Advertising);
        assert!(!link.is_connected());

        // Spurious disconnect does not underflow
        link.disconnected();
        assert_eq!(link.connection_count(), 0);
    }

    #[test]
    fn test_link_stays_connected_while_any_central_remains() {
        let link = HidLink::new();
        link.advertising_started();
        link.connected();
        link.connected();
        link.disconnected();
        assert!(link.is_connected());
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let channel: Channel<CriticalSectionRawMutex, MediaKey, 2> = Channel::new();
        let mut sink = channel.sender();

        sink.send_key(MediaKey::PlayPause);
        sink.send_key(MediaKey::NextTrack);
        sink.send_key(MediaKey::Stop);

        assert_eq!(channel.try_receive().ok(), Some(MediaKey::PlayPause));
        assert_eq!(channel.try_receive().ok(), Some(MediaKey::NextTrack));
        assert!(channel.try_receive().is_err());
    }
}
