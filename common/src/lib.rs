pub mod blob;
pub mod schedule;
pub mod settings;
pub mod status;
pub mod types;

pub use blob::{
    decode_device_settings, encode_alarm_payload, encode_device_settings, AlarmPayload, BlobError,
};
pub use schedule::{AlarmSchedule, DailySchedule, DayOfWeek, PowerSchedule, Schedules, SideSchedule};
pub use settings::{PrimePodDaily, Settings, SideSettings};
pub use status::{level_from_f, level_to_f, parse_device_status, DeviceStatus, MalformedStatus, SideStatus};
pub use types::{Side, TemperatureFormat, TimeOfDay, VibrationPattern};
