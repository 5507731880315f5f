//! OID constants and vendor code-point maps shared by the collectors and
//! the mock engine.

// ── SNMPv2-MIB ────────────────────────────────────────────────────────────────
pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
pub const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";

// ── IF-MIB ────────────────────────────────────────────────────────────────────
pub const IF_OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8";
pub const IF_IN_ERRORS: &str = "1.3.6.1.2.1.2.2.1.14";
pub const IF_OUT_ERRORS: &str = "1.3.6.1.2.1.2.2.1.20";
pub const IF_NAME: &str = "1.3.6.1.2.1.31.1.1.1.1";
pub const IF_HIGH_SPEED: &str = "1.3.6.1.2.1.31.1.1.1.15";

// ── EtherLike-MIB ─────────────────────────────────────────────────────────────
pub const DOT3_STATS_DUPLEX: &str = "1.3.6.1.2.1.10.7.2.1.19";

// ── BRIDGE-MIB / Q-BRIDGE-MIB ─────────────────────────────────────────────────
pub const DOT1D_BASE_PORT_IF_INDEX: &str = "1.3.6.1.2.1.17.1.4.1.2";
pub const DOT1D_TP_FDB_PORT: &str = "1.3.6.1.2.1.17.4.3.1.2";
pub const DOT1Q_TP_FDB_PORT: &str = "1.3.6.1.2.1.17.7.1.2.2.1.2";

// ── IEEE8023-LAG-MIB ──────────────────────────────────────────────────────────
pub const DOT3AD_AGG_PORT_ATTACHED_AGG_ID: &str = "1.2.840.10006.300.43.1.2.1.1.13";
pub const DOT3AD_AGG_PORT_ACTOR_OPER_STATE: &str = "1.2.840.10006.300.43.1.2.1.1.21";

// ── LLDP-MIB ──────────────────────────────────────────────────────────────────
pub const LLDP_LOC_PORT_DESC: &str = "1.0.8802.1.1.2.1.3.7.1.4";
pub const LLDP_REM_PORT_ID: &str = "1.0.8802.1.1.2.1.4.1.1.7";
pub const LLDP_REM_PORT_DESC: &str = "1.0.8802.1.1.2.1.4.1.1.8";
pub const LLDP_REM_SYS_NAME: &str = "1.0.8802.1.1.2.1.4.1.1.9";

// ── ENTITY-MIB ────────────────────────────────────────────────────────────────
pub const ENT_PHYSICAL_CONTAINED_IN: &str = "1.3.6.1.2.1.47.1.1.1.1.4";
pub const ENT_PHYSICAL_CLASS: &str = "1.3.6.1.2.1.47.1.1.1.1.5";
pub const ENT_PHYSICAL_NAME: &str = "1.3.6.1.2.1.47.1.1.1.1.7";

pub const ENT_PHYSICAL_CLASS_POWER_SUPPLY: i64 = 6;
pub const ENT_PHYSICAL_CLASS_FAN: i64 = 7;

// ── HH3C (HPE Comware) enterprise MIBs ────────────────────────────────────────
pub const HH3C_ENTITY_EXT_ERROR_STATUS: &str = "1.3.6.1.4.1.25506.2.6.1.1.1.1.19";
pub const HH3C_TRANSCEIVER_TX_POWER: &str = "1.3.6.1.4.1.25506.2.70.1.1.1.9";
pub const HH3C_TRANSCEIVER_RX_POWER: &str = "1.3.6.1.4.1.25506.2.70.1.1.1.12";
pub const HH3C_TRANSCEIVER_TEMPERATURE: &str = "1.3.6.1.4.1.25506.2.70.1.1.1.15";
pub const HH3C_TRANSCEIVER_VOLTAGE: &str = "1.3.6.1.4.1.25506.2.70.1.1.1.16";

// ── CISCO-ENVMON-MIB ──────────────────────────────────────────────────────────
pub const CISCO_ENV_FAN_DESCR: &str = "1.3.6.1.4.1.9.9.13.1.4.1.2";
pub const CISCO_ENV_FAN_STATE: &str = "1.3.6.1.4.1.9.9.13.1.4.1.3";
pub const CISCO_ENV_SUPPLY_DESCR: &str = "1.3.6.1.4.1.9.9.13.1.5.1.2";
pub const CISCO_ENV_SUPPLY_STATE: &str = "1.3.6.1.4.1.9.9.13.1.5.1.3";

// ── CISCO-ENTITY-SENSOR-MIB ───────────────────────────────────────────────────
pub const CISCO_ENT_SENSOR_TYPE: &str = "1.3.6.1.4.1.9.9.91.1.1.1.1.1";
pub const CISCO_ENT_SENSOR_SCALE: &str = "1.3.6.1.4.1.9.9.91.1.1.1.1.2";
pub const CISCO_ENT_SENSOR_PRECISION: &str = "1.3.6.1.4.1.9.9.91.1.1.1.1.3";
pub const CISCO_ENT_SENSOR_VALUE: &str = "1.3.6.1.4.1.9.9.91.1.1.1.1.4";

pub const CISCO_SENSOR_TYPE_VOLTS_DC: i64 = 4;
pub const CISCO_SENSOR_TYPE_CELSIUS: i64 = 8;
pub const CISCO_SENSOR_TYPE_DBM: i64 = 14;

// ── CISCO-CDP-MIB ─────────────────────────────────────────────────────────────
pub const CISCO_CDP_CACHE_DEVICE_ID: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.6";
pub const CISCO_CDP_CACHE_DEVICE_PORT: &str = "1.3.6.1.4.1.9.9.23.1.2.1.1.7";

// ── CISCO-VTP-MIB ─────────────────────────────────────────────────────────────
pub const CISCO_VTP_VLAN_STATE: &str = "1.3.6.1.4.1.9.9.46.1.3.1.1.2";

// ── Code-point maps ───────────────────────────────────────────────────────────

/// CISCO-ENVMON-MIB CiscoEnvMonState.
pub fn envmon_state(code: i64) -> &'static str {
    match code {
        1 => "normal",
        2 => "warning",
        3 => "critical",
        4 => "shutdown",
        5 => "notPresent",
        6 => "notFunctioning",
        _ => "unknown",
    }
}

/// HH3C-ENTITY-EXT-MIB hh3cEntityExtErrorStatus (the codes the fleet
/// actually reports).
pub fn hh3c_error_status(code: i64) -> &'static str {
    match code {
        1 => "unknown",
        2 => "normal",
        3 => "postFailure",
        41 => "fanError",
        51 => "psuError",
        61 => "rpsError",
        91 => "portError",
        _ => "unknown",
    }
}

/// IF-MIB ifOperStatus.
pub fn if_oper_status(code: i64) -> &'static str {
    match code {
        1 => "up",
        2 => "down",
        3 => "testing",
        _ => "unknown",
    }
}

/// EtherLike-MIB dot3StatsDuplexStatus.
pub fn duplex_status(code: i64) -> &'static str {
    match code {
        2 => "half",
        3 => "full",
        _ => "unknown",
    }
}

/// CISCO-ENTITY-SENSOR-MIB SensorDataScale → multiplier.
pub fn sensor_scale_factor(code: i64) -> f64 {
    match code {
        1 => 1e-24,  // yocto
        2 => 1e-21,  // zepto
        3 => 1e-18,  // atto
        4 => 1e-15,  // femto
        5 => 1e-12,  // pico
        6 => 1e-9,   // nano
        7 => 1e-6,   // micro
        8 => 1e-3,   // milli
        9 => 1.0,    // units
        10 => 1e3,   // kilo
        11 => 1e6,   // mega
        12 => 1e9,   // giga
        13 => 1e12,  // tera
        14 => 1e18,  // exa
        15 => 1e15,  // peta
        16 => 1e21,  // zetta
        17 => 1e24,  // yotta
        _ => 1.0,
    }
}
