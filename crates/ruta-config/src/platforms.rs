//! Reference platform tables bundled with the library.
//!
//! These tables describe two phone platforms: an LPE-centric board with no
//! explicit SSP ports (`saltbay`) and an IA-centric board whose voice and
//! media paths contend for shared I2S ports (`redhookbay`). They are always
//! available without external files and serve as starting points.

use crate::PlatformConfig;

/// Names of the bundled platforms.
pub static BUILTIN_PLATFORM_NAMES: &[&str] = &["redhookbay", "saltbay"];

static BUILTIN_PLATFORMS_TOML: &[(&str, &str)] = &[
    ("redhookbay", REDHOOKBAY),
    ("saltbay", SALTBAY),
];

/// Criterion types and criteria shared by the bundled platforms.
macro_rules! phone_criteria {
    () => {
        r#"
[[criterion_types]]
name = "ModeType"
values = [
    { literal = "Normal", value = 0 },
    { literal = "RingTone", value = 1 },
    { literal = "InCall", value = 2 },
    { literal = "InCommunication", value = 3 },
]

[[criterion_types]]
name = "OutputDevicesType"
inclusive = true
values = [
    { literal = "Earpiece", value = 1 },
    { literal = "Speaker", value = 2 },
    { literal = "WiredHeadset", value = 4 },
    { literal = "WiredHeadphone", value = 8 },
    { literal = "BluetoothSco", value = 16 },
]

[[criterion_types]]
name = "BooleanType"
values = [
    { literal = "False", value = 0 },
    { literal = "True", value = 1 },
]

[[criteria]]
name = "Mode"
type = "ModeType"
default = "Normal"

[[criteria]]
name = "SelectedOutputDevices"
type = "OutputDevicesType"
default = "Speaker"

[[criteria]]
name = "MicMute"
type = "BooleanType"
default = "False"
"#
    };
}

/// IA-centric board: voice paths share `IA_I2S1_PORT`, the codec voice port
/// excludes both the codec media port and the Bluetooth port.
const REDHOOKBAY: &str = concat!(
    r#"
name = "redhookbay"
description = "IA-centric phone, cloverview audio card, shared voice I2S"
ports = [
    "LPE_I2S2_PORT",
    "LPE_I2S3_PORT",
    "IA_I2S0_PORT",
    "IA_I2S1_PORT",
    "MODEM_I2S1_PORT",
    "MODEM_I2S2_PORT",
    "BT_I2S_PORT",
    "FM_I2S_PORT",
    "HWCODEC_ASP_PORT",
    "HWCODEC_VSP_PORT",
    "HWCODEC_AUX_PORT",
]

[[port_groups]]
name = "HwCodecMediaVoice"
ports = ["HWCODEC_ASP_PORT", "HWCODEC_VSP_PORT"]

[[port_groups]]
name = "VoiceBt"
ports = ["HWCODEC_VSP_PORT", "BT_I2S_PORT"]

[[port_groups]]
name = "CommCsv"
ports = ["IA_I2S1_PORT", "MODEM_I2S1_PORT"]

[[routes]]
name = "Media"
kind = "stream"
directions = ["input", "output"]
applicable = true

[routes.capture]
card_name = "cloverviewaudio"
period_size = 960
applicability_mask = 227

[routes.playback]
card_name = "cloverviewaudio"
period_size = 1152
applicability_mask = 2

[[routes]]
name = "DeepMedia"
kind = "stream"
directions = ["output"]
applicable = true

[routes.playback]
card_name = "cloverviewaudio"
period_size = 4608
period_count = 2
applicability_mask = 8

[[routes]]
name = "ModemMix"
kind = "stream"
ports = ["IA_I2S0_PORT", "MODEM_I2S2_PORT"]
directions = ["input", "output"]

[routes.capture]
card_name = "cloverviewaudio"
device_id = 5
applicability_mask = 126

[routes.playback]
card_name = "cloverviewaudio"
device_id = 5
applicability_mask = 2
channel_policy = ["average", "ignore"]

[[routes]]
name = "HwCodecComm"
kind = "stream"
ports = ["IA_I2S1_PORT", "HWCODEC_VSP_PORT"]
directions = ["input", "output"]

[routes.capture]
require_pre_enable = true
require_post_disable = true
card_name = "cloverviewaudio"
device_id = 4
applicability_mask = 131
effects = ["aec", "ns", "agc"]

[routes.playback]
require_pre_enable = true
require_post_disable = true
card_name = "cloverviewaudio"
device_id = 4
applicability_mask = 2

[[routes]]
name = "BtComm"
kind = "stream"
ports = ["IA_I2S1_PORT", "BT_I2S_PORT"]
directions = ["input", "output"]

[routes.capture]
require_pre_enable = true
require_post_disable = true
card_name = "cloverviewaudio"
device_id = 3
channels = 1
rate = 8000
period_size = 160
applicability_mask = 195

[routes.playback]
require_pre_enable = true
require_post_disable = true
card_name = "cloverviewaudio"
device_id = 3
channels = 1
rate = 8000
period_size = 160
applicability_mask = 2

[[routes]]
name = "HwCodecMedia"
ports = ["LPE_I2S3_PORT", "HWCODEC_ASP_PORT"]
directions = ["input", "output"]

[[routes]]
name = "HwCodecCSV"
ports = ["MODEM_I2S1_PORT", "HWCODEC_VSP_PORT"]
directions = ["output"]

[[routes]]
name = "BtCSV"
ports = ["MODEM_I2S1_PORT", "BT_I2S_PORT"]
directions = ["output"]

[[routes]]
name = "HwCodecFm"
ports = ["FM_I2S_PORT", "LPE_I2S2_PORT"]
directions = ["input"]

[[routes]]
name = "VirtualASP"
directions = ["output"]
"#,
    phone_criteria!()
);

/// LPE-centric board: every stream goes through the LPE, no port contention.
const SALTBAY: &str = concat!(
    r#"
name = "saltbay"
description = "LPE-centric phone, wm8958 codec"

[[routes]]
name = "Media"
kind = "stream"
directions = ["input", "output"]
applicable = true

[routes.capture]
card_name = "wm8958audio"
period_size = 960
applicability_mask = 127
channel_policy = ["copy", "ignore"]

[routes.playback]
card_name = "wm8958audio"
period_size = 1152
applicability_mask = 2

[[routes]]
name = "DeepMedia"
kind = "stream"
directions = ["output"]
applicable = true

[routes.playback]
card_name = "wm8958audio"
period_size = 4608
applicability_mask = 8

[[routes]]
name = "Voice"
kind = "stream"
directions = ["input", "output"]

[routes.capture]
card_name = "wm8958audio"
device_id = 2
rate = 16000
period_size = 320
applicability_mask = 130
channel_policy = ["copy", "ignore"]
effects = ["agc", "aec", "ns"]

[routes.playback]
card_name = "wm8958audio"
device_id = 2
rate = 16000
period_size = 384
applicability_mask = 2

[[routes]]
name = "HwCodec0IA"
directions = ["input", "output"]

[[routes]]
name = "HwCodec1IA"
directions = ["input", "output"]

[[routes]]
name = "CmeVoice"
directions = ["output"]

[[routes]]
name = "ModemIA"
directions = ["input", "output"]

[[routes]]
name = "BtIA"
directions = ["input", "output"]

[[routes]]
name = "FMIA"
directions = ["input"]

[[routes]]
name = "ContextAwareness"
directions = ["input"]

[[routes]]
name = "AlwaysListening"
directions = ["input"]
"#,
    phone_criteria!()
);

/// All bundled platforms, in name order.
pub fn builtin_platforms() -> Vec<PlatformConfig> {
    BUILTIN_PLATFORMS_TOML
        .iter()
        .filter_map(|(_, toml)| PlatformConfig::from_toml(toml).ok())
        .collect()
}

/// A bundled platform by name, case-insensitive.
pub fn builtin_platform(name: &str) -> Option<PlatformConfig> {
    BUILTIN_PLATFORMS_TOML
        .iter()
        .find(|(platform, _)| platform.eq_ignore_ascii_case(name))
        .and_then(|(_, toml)| PlatformConfig::from_toml(toml).ok())
}

/// Whether `name` is a bundled platform.
pub fn is_builtin_platform(name: &str) -> bool {
    BUILTIN_PLATFORM_NAMES
        .iter()
        .any(|p| p.eq_ignore_ascii_case(name))
}
