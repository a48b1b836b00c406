use uuid::{uuid, Uuid};

/**
 * The UUID of the Bluetooth BLE service exposed by the spectrometer.
 */
pub const SPECTROMETER_SERVICE: Uuid = uuid!("4fafc201-1fb5-459e-8fcc-c5c9c331914b");

/**
 * The UUID of the characteristic the spectrometer sends its readings on (notify).
 */
pub const SPECTROMETER_DATA_CHARACTERISTIC: Uuid = uuid!("beb5483e-36e1-4688-b7f5-ea07361b26a8");

/**
 * Android API level starting from which BLUETOOTH_SCAN / BLUETOOTH_CONNECT replace the
 * location permission as the prerequisite for scanning.
 */
pub const MODERN_PERMISSION_API_LEVEL: u32 = 31;

/**
 * Buffer size of the channel carrying commands into a device session.
 */
pub const COMMAND_CHANNEL_SIZE: usize = 8;

/**
 * Buffer size of the channel carrying events out of a device session.
 */
pub const EVENT_CHANNEL_SIZE: usize = 64;
