//! BLE HID consumer-control peripheral.
//!
//! One GATT server with the HID and Device Information services. The task
//! advertises, serves one central at a time, and turns keys queued on
//! [`MEDIA_KEY_CHANNEL`] into press/release notifications on the input
//! report. Keys queued while nobody is connected are dropped.

use core::convert::Infallible;

use bt_hci::controller::ExternalController;
use embassy_futures::join::join;
use embassy_futures::select::{Either, select};
use embassy_time::Timer;
use esp_radio::ble::controller::BleConnector;
use log::{debug, info, warn};
use static_cell::StaticCell;
use trouble_host::prelude::*;

use tickerdeck_core::config::{DEVICE_NAME, MANUFACTURER};
use tickerdeck_core::hid::{
    APPEARANCE_KEYBOARD, HID_INFORMATION, HID_LINK, HID_SERVICE_UUID, INPUT_REPORT_REFERENCE,
    MEDIA_KEY_CHANNEL, MediaController, MediaKeyReport, OUTPUT_REPORT_REFERENCE, PNP_ID,
    PROTOCOL_MODE_REPORT, REPORT_MAP, ReportNotifier,
};

const CONNECTIONS_MAX: usize = 1;
const L2CAP_CHANNELS_MAX: usize = 2;

/// HCI command slots for the esp-radio controller.
pub const HCI_SLOTS: usize = 20;

pub type BleController = ExternalController<BleConnector<'static>, HCI_SLOTS>;

/// Static random address, little-endian; top two bits of the last byte set.
const ADDRESS: [u8; 6] = [0x3c, 0x71, 0xbf, 0x5e, 0xa1, 0xe6];

const MANUFACTURER_NAME: [u8; MANUFACTURER.len()] = {
    let src = MANUFACTURER.as_bytes();
    let mut out = [0u8; MANUFACTURER.len()];
    let mut i = 0;
    while i < src.len() {
        out[i] = src[i];
        i += 1;
    }
    out
};

const PNP_ID_BYTES: [u8; 7] = PNP_ID.to_bytes();

// =============================================================================
// GATT layout
// =============================================================================

#[gatt_server]
struct Server {
    hid: HidService,
    device_info: DeviceInformationService,
}

#[gatt_service(uuid = "1812")]
struct HidService {
    #[characteristic(uuid = "2a4a", read, value = HID_INFORMATION)]
    hid_information: [u8; 4],
    #[characteristic(uuid = "2a4b", read, value = REPORT_MAP)]
    report_map: [u8; 39],
    #[characteristic(uuid = "2a4c", write_without_response)]
    control_point: u8,
    #[characteristic(uuid = "2a4e", read, write_without_response, value = PROTOCOL_MODE_REPORT)]
    protocol_mode: u8,
    #[descriptor(uuid = "2908", read, value = INPUT_REPORT_REFERENCE)]
    #[characteristic(uuid = "2a4d", read, notify)]
    input_report: [u8; MediaKeyReport::SIZE],
    #[descriptor(uuid = "2908", read, value = OUTPUT_REPORT_REFERENCE)]
    #[characteristic(uuid = "2a4d", read, write, write_without_response)]
    output_report: [u8; 1],
}

#[gatt_service(uuid = "180a")]
struct DeviceInformationService {
    #[characteristic(uuid = "2a29", read, value = MANUFACTURER_NAME)]
    manufacturer: [u8; MANUFACTURER.len()],
    #[characteristic(uuid = "2a50", read, value = PNP_ID_BYTES)]
    pnp_id: [u8; 7],
}

// =============================================================================
// Report notifier
// =============================================================================

/// Sends input reports to the connected central.
struct GattNotifier<'a, 'values, 'server> {
    report: &'a Characteristic<[u8; MediaKeyReport::SIZE]>,
    conn: &'a GattConnection<'values, 'server, DefaultPacketPool>,
}

impl ReportNotifier for GattNotifier<'_, '_, '_> {
    type Error = trouble_host::Error;

    async fn notify(&mut self, report: [u8; MediaKeyReport::SIZE]) -> Result<(), Self::Error> {
        self.report.notify(self.conn, &report).await
    }
}

// =============================================================================
// Task
// =============================================================================

/// Bring up the host, then advertise and serve forever.
///
/// Host setup failures are unrecoverable and panic.
#[embassy_executor::task]
pub async fn ble_task(controller: BleController) {
    static RESOURCES: StaticCell<
        HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX>,
    > = StaticCell::new();
    let resources = RESOURCES.init(HostResources::new());

    let address = Address::random(ADDRESS);
    info!("BLE address = {:?}", address);
    let stack = trouble_host::new(controller, resources).set_random_address(address);
    let Host {
        mut peripheral,
        runner,
        ..
    } = stack.build();

    let server = match Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
        name: DEVICE_NAME,
        appearance: &appearance::human_interface_device::KEYBOARD,
    })) {
        Ok(server) => server,
        Err(e) => panic!("GATT server setup failed: {:?}", e),
    };

    info!("BLE HID ready, advertising as '{}'", DEVICE_NAME);
    join(run_host(runner), async {
        loop {
            HID_LINK.advertising_started();
            let conn = match select(advertise(&mut peripheral, &server), discard_keys()).await {
                Either::First(Ok(conn)) => conn,
                Either::First(Err(e)) => {
                    warn!("Advertising failed: {:?}", e);
                    Timer::after_secs(1).await;
                    continue;
                }
                Either::Second(never) => match never {},
            };

            HID_LINK.connected();
            info!("Central connected");
            serve_connection(&server, &conn).await;
            HID_LINK.disconnected();
            info!("Central disconnected, advertising again");
        }
    })
    .await;
}

async fn run_host<C: Controller, P: PacketPool>(mut runner: Runner<'_, C, P>) {
    loop {
        if let Err(e) = runner.run().await {
            panic!("BLE host stopped: {:?}", e);
        }
    }
}

async fn advertise<'values, 'server, C: Controller>(
    peripheral: &mut Peripheral<'values, C, DefaultPacketPool>,
    server: &'server Server<'values>,
) -> Result<GattConnection<'values, 'server, DefaultPacketPool>, BleHostError<C::Error>> {
    let appearance = APPEARANCE_KEYBOARD.to_le_bytes();
    let mut adv_data = [0; 31];
    let len = AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids16(&[HID_SERVICE_UUID.to_le_bytes()]),
            AdStructure::Unknown {
                ty: 0x19,
                data: &appearance,
            },
        ],
        &mut adv_data[..],
    )?;

    // The full name does not fit next to the HID fields
    let mut scan_data = [0; 31];
    let scan_len = AdStructure::encode_slice(
        &[AdStructure::CompleteLocalName(DEVICE_NAME.as_bytes())],
        &mut scan_data[..],
    )?;

    let advertiser = peripheral
        .advertise(
            &Default::default(),
            Advertisement::ConnectableScannableUndirected {
                adv_data: &adv_data[..len],
                scan_data: &scan_data[..scan_len],
            },
        )
        .await?;
    let conn = advertiser.accept().await?.with_attribute_server(server)?;
    Ok(conn)
}

/// Drain keys while no central is connected.
async fn discard_keys() -> Infallible {
    loop {
        let key = MEDIA_KEY_CHANNEL.receive().await;
        debug!(" No central connected, dropping {:?}", key);
    }
}

/// Answer GATT requests and forward queued keys until the link drops.
async fn serve_connection(
    server: &Server<'_>,
    conn: &GattConnection<'_, '_, DefaultPacketPool>,
) {
    let mut media = MediaController::new(GattNotifier {
        report: &server.hid.input_report,
        conn,
    });
    let protocol_mode = &server.hid.protocol_mode;

    loop {
        match select(conn.next(), MEDIA_KEY_CHANNEL.receive()).await {
            Either::First(GattConnectionEvent::Disconnected { reason }) => {
                info!("Disconnected: {:?}", reason);
                return;
            }
            Either::First(GattConnectionEvent::Gatt { event }) => match event {
                GattEvent::Write(event) => {
                    if event.handle() == protocol_mode.handle {
                        debug!(" Protocol mode write {:?}", event.data());
                    }
                    match event.accept() {
                        Ok(reply) => reply.send().await,
                        Err(e) => warn!("GATT write reply failed: {:?}", e),
                    }
                }
                GattEvent::Read(event) => match event.accept() {
                    Ok(reply) => reply.send().await,
                    Err(e) => warn!("GATT read reply failed: {:?}", e),
                },
                _ => {}
            },
            Either::First(_) => {}
            Either::Second(key) => media.send_media_key_press(key).await,
        }
    }
}
