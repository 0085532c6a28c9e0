use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use cell_core::{CellId, Imsi, Lac, NodeId, SimTime};
use serde::Deserialize;
use toml::Value;

use super::sim_config::{
    AdmissionPolicyKind, CfgAdmission, CfgBs, CfgGateway, CfgHandover, CfgHlr, CfgLimits, CfgMs, CfgSc,
    CfgScriptEntry, CfgTimers, CfgTransport, ScriptAction, SharedConfig, SimConfig,
};

const EXPECTED_CONFIG_VERSION: &str = "0.1";

/// Build `SharedConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    if !root.config_version.eq(EXPECTED_CONFIG_VERSION) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, EXPECTED_CONFIG_VERSION
        )
        .into());
    }
    check_extra("", &root.extra)?;

    let mut cfg = SimConfig {
        debug_log: root.debug_log,
        seed: root.seed.unwrap_or(1),
        ..Default::default()
    };

    if let Some(timers) = root.timers {
        check_extra("timers", &timers.extra)?;
        apply_timers_patch(&mut cfg.timers, timers)?;
    }
    if let Some(limits) = root.limits {
        check_extra("limits", &limits.extra)?;
        apply_limits_patch(&mut cfg.limits, limits);
    }
    if let Some(transport) = root.transport {
        check_extra("transport", &transport.extra)?;
        apply_transport_patch(&mut cfg.transport, transport)?;
    }
    if let Some(admission) = root.admission {
        check_extra("admission", &admission.extra)?;
        apply_admission_patch(&mut cfg.admission, admission);
    }
    if let Some(handover) = root.handover {
        check_extra("handover", &handover.extra)?;
        apply_handover_patch(&mut cfg.handover, handover);
    }

    for hlr in root.hlr {
        check_extra("hlr", &hlr.extra)?;
        cfg.hlrs.push(CfgHlr { node: hlr.node });
    }
    for gw in root.gateway {
        check_extra("gateway", &gw.extra)?;
        cfg.gateways.push(CfgGateway {
            node: gw.node,
            address_pool: gw.address_pool.unwrap_or(254),
            base_address: gw.base_address.unwrap_or(0x0a00_0001),
        });
    }
    for sc in root.sc {
        check_extra("sc", &sc.extra)?;
        cfg.scs.push(CfgSc {
            node: sc.node,
            hlr: sc.hlr,
            gateway: sc.gateway,
            circuits: sc.circuits.unwrap_or(100),
        });
    }
    for bs in root.bs {
        check_extra("bs", &bs.extra)?;
        cfg.bss.push(CfgBs {
            node: bs.node,
            sc: bs.sc,
            lac: bs.lac,
            cells: bs.cells,
            channels: bs.channels.unwrap_or(10),
            channel_bandwidth_kbps: bs.channel_bandwidth_kbps.unwrap_or(16),
        });
    }
    for ms in root.ms {
        check_extra("ms", &ms.extra)?;
        cfg.mss.push(CfgMs {
            node: ms.node,
            imsi: ms.imsi,
            cell: ms.cell,
            power_on: ms.power_on.unwrap_or(true),
        });
    }
    for entry in root.script {
        check_extra("script", &entry.extra)?;
        cfg.script.push(script_entry_from_dto(entry)?);
    }

    Ok(SharedConfig::try_from_config(cfg)?)
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn check_extra(section: &str, extra: &HashMap<String, Value>) -> Result<(), String> {
    if extra.is_empty() {
        return Ok(());
    }
    if section.is_empty() {
        Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(extra)))
    } else {
        Err(format!("Unrecognized fields in {}: {:?}", section, sorted_keys(extra)))
    }
}

fn secs(field: &str, v: f64) -> Result<Duration, String> {
    if !v.is_finite() || v < 0.0 {
        return Err(format!("timers.{} must be a non-negative number of seconds, got {}", field, v));
    }
    Ok(Duration::from_secs_f64(v))
}

fn apply_timers_patch(dst: &mut CfgTimers, src: TimersDto) -> Result<(), String> {
    let fields: [(&str, Option<f64>, &mut Duration); 22] = [
        ("t3126", src.t3126, &mut dst.t3126),
        ("t3101", src.t3101, &mut dst.t3101),
        ("t3210", src.t3210, &mut dst.t3210),
        ("t3211", src.t3211, &mut dst.t3211),
        ("t3212", src.t3212, &mut dst.t3212),
        ("t3230", src.t3230, &mut dst.t3230),
        ("t3113", src.t3113, &mut dst.t3113),
        ("t301", src.t301, &mut dst.t301),
        ("t303", src.t303, &mut dst.t303),
        ("t305", src.t305, &mut dst.t305),
        ("t308", src.t308, &mut dst.t308),
        ("t310", src.t310, &mut dst.t310),
        ("t313", src.t313, &mut dst.t313),
        ("t3380", src.t3380, &mut dst.t3380),
        ("t3390", src.t3390, &mut dst.t3390),
        ("t3395", src.t3395, &mut dst.t3395),
        ("t3_response", src.t3_response, &mut dst.t3_response),
        ("t7", src.t7, &mut dst.t7),
        ("t8", src.t8, &mut dst.t8),
        ("t3103", src.t3103, &mut dst.t3103),
        ("vlr_lifetime", src.vlr_lifetime, &mut dst.vlr_lifetime),
        ("answer_delay", src.answer_delay, &mut dst.answer_delay),
    ];
    for (name, value, target) in fields {
        if let Some(v) = value {
            *target = secs(name, v)?;
        }
    }
    if let Some(v) = src.pdp_lifetime {
        dst.pdp_lifetime = Some(secs("pdp_lifetime", v)?);
    }
    Ok(())
}

fn apply_limits_patch(dst: &mut CfgLimits, src: LimitsDto) {
    if let Some(v) = src.num_channel_request_attempts {
        dst.num_channel_request_attempts = v;
    }
    if let Some(v) = src.max_location_update_attempts {
        dst.max_location_update_attempts = v;
    }
    if let Some(v) = src.max_release_attempts {
        dst.max_release_attempts = v;
    }
    if let Some(v) = src.max_sm_attempts {
        dst.max_sm_attempts = v;
    }
    if let Some(v) = src.max_paging_attempts {
        dst.max_paging_attempts = v;
    }
    if let Some(v) = src.n3_requests {
        dst.n3_requests = v;
    }
    if let Some(v) = src.max_active_app_per_ms {
        dst.max_active_app_per_ms = v;
    }
    if let Some(v) = src.max_active_app_per_bs {
        dst.max_active_app_per_bs = v;
    }
    if let Some(v) = src.max_active_app_per_sc {
        dst.max_active_app_per_sc = v;
    }
    if let Some(v) = src.max_contexts_per_gateway {
        dst.max_contexts_per_gateway = v;
    }
}

fn apply_transport_patch(dst: &mut CfgTransport, src: TransportDto) -> Result<(), String> {
    if let Some(ms) = src.radio_delay_ms {
        dst.radio_delay = Duration::from_millis(ms);
    }
    if let Some(ms) = src.wired_delay_ms {
        dst.wired_delay = Duration::from_millis(ms);
    }
    if dst.radio_delay.is_zero() && dst.wired_delay.is_zero() {
        return Err("transport delays may not both be zero".to_string());
    }
    Ok(())
}

fn apply_admission_patch(dst: &mut CfgAdmission, src: AdmissionDto) {
    if let Some(v) = src.policy {
        dst.policy = v;
    }
    if let Some(v) = src.guard_channels {
        dst.guard_channels = v;
    }
    dst.max_users = src.max_users.or(dst.max_users);
    if let Some(v) = src.refrain_threshold {
        dst.refrain_threshold = v;
    }
    if let Some(v) = src.refrain_probability {
        dst.refrain_probability = v;
    }
}

fn apply_handover_patch(dst: &mut CfgHandover, src: HandoverDto) {
    if let Some(v) = src.enabled {
        dst.enabled = v;
    }
    if let Some(v) = src.threshold {
        dst.threshold = v;
    }
    if let Some(v) = src.margin {
        dst.margin = v;
    }
    if let Some(v) = src.min_access_quality {
        dst.min_access_quality = v;
    }
}

fn script_entry_from_dto(dto: ScriptEntryDto) -> Result<CfgScriptEntry, String> {
    fn need<T>(v: Option<T>, action: &str, field: &str) -> Result<T, String> {
        v.ok_or_else(|| format!("script action {} requires field {}", action, field))
    }

    let action = match dto.action {
        ScriptActionKind::PowerOn => ScriptAction::PowerOn,
        ScriptActionKind::PowerOff => ScriptAction::PowerOff,
        ScriptActionKind::Call => ScriptAction::Call {
            callee: need(dto.callee, "Call", "callee")?,
            bandwidth_kbps: dto.bandwidth_kbps.unwrap_or(16),
        },
        ScriptActionKind::HangUp => ScriptAction::HangUp,
        ScriptActionKind::ActivatePdp => ScriptAction::ActivatePdp {
            nsapi: need(dto.nsapi, "ActivatePdp", "nsapi")?,
            bandwidth_kbps: dto.bandwidth_kbps.unwrap_or(32),
        },
        ScriptActionKind::DeactivatePdp => ScriptAction::DeactivatePdp {
            nsapi: need(dto.nsapi, "DeactivatePdp", "nsapi")?,
        },
        ScriptActionKind::Measurement => ScriptAction::Measurement {
            cell: need(dto.cell, "Measurement", "cell")?,
            quality: need(dto.quality, "Measurement", "quality")?,
        },
        ScriptActionKind::CampOn => ScriptAction::CampOn {
            cell: need(dto.cell, "CampOn", "cell")?,
        },
    };
    if !dto.at.is_finite() || dto.at < 0.0 {
        return Err(format!("script entry has invalid time {}", dto.at));
    }
    Ok(CfgScriptEntry {
        at: SimTime::from_secs_f64(dto.at),
        node: dto.node,
        action,
    })
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,
    seed: Option<u64>,

    #[serde(default)]
    timers: Option<TimersDto>,
    #[serde(default)]
    limits: Option<LimitsDto>,
    #[serde(default)]
    transport: Option<TransportDto>,
    #[serde(default)]
    admission: Option<AdmissionDto>,
    #[serde(default)]
    handover: Option<HandoverDto>,

    #[serde(default)]
    hlr: Vec<HlrDto>,
    #[serde(default)]
    gateway: Vec<GatewayDto>,
    #[serde(default)]
    sc: Vec<ScDto>,
    #[serde(default)]
    bs: Vec<BsDto>,
    #[serde(default)]
    ms: Vec<MsDto>,
    #[serde(default)]
    script: Vec<ScriptEntryDto>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct TimersDto {
    t3126: Option<f64>,
    t3101: Option<f64>,
    t3210: Option<f64>,
    t3211: Option<f64>,
    t3212: Option<f64>,
    t3230: Option<f64>,
    t3113: Option<f64>,
    t301: Option<f64>,
    t303: Option<f64>,
    t305: Option<f64>,
    t308: Option<f64>,
    t310: Option<f64>,
    t313: Option<f64>,
    t3380: Option<f64>,
    t3390: Option<f64>,
    t3395: Option<f64>,
    t3_response: Option<f64>,
    t7: Option<f64>,
    t8: Option<f64>,
    t3103: Option<f64>,
    vlr_lifetime: Option<f64>,
    answer_delay: Option<f64>,
    pdp_lifetime: Option<f64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct LimitsDto {
    num_channel_request_attempts: Option<u8>,
    max_location_update_attempts: Option<u8>,
    max_release_attempts: Option<u8>,
    max_sm_attempts: Option<u8>,
    max_paging_attempts: Option<u8>,
    n3_requests: Option<u8>,
    max_active_app_per_ms: Option<u16>,
    max_active_app_per_bs: Option<u16>,
    max_active_app_per_sc: Option<u16>,
    max_contexts_per_gateway: Option<u16>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct TransportDto {
    radio_delay_ms: Option<u64>,
    wired_delay_ms: Option<u64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct AdmissionDto {
    policy: Option<AdmissionPolicyKind>,
    guard_channels: Option<u16>,
    max_users: Option<u16>,
    refrain_threshold: Option<u16>,
    refrain_probability: Option<f64>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct HandoverDto {
    enabled: Option<bool>,
    threshold: Option<u8>,
    margin: Option<u8>,
    min_access_quality: Option<u8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct HlrDto {
    node: NodeId,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct GatewayDto {
    node: NodeId,
    address_pool: Option<u16>,
    base_address: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct ScDto {
    node: NodeId,
    hlr: NodeId,
    gateway: Option<NodeId>,
    circuits: Option<u16>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct BsDto {
    node: NodeId,
    sc: NodeId,
    lac: Lac,
    cells: Vec<CellId>,
    channels: Option<u16>,
    channel_bandwidth_kbps: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct MsDto {
    node: NodeId,
    imsi: Imsi,
    cell: CellId,
    power_on: Option<bool>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum ScriptActionKind {
    PowerOn,
    PowerOff,
    Call,
    HangUp,
    ActivatePdp,
    DeactivatePdp,
    Measurement,
    CampOn,
}

#[derive(Deserialize)]
struct ScriptEntryDto {
    at: f64,
    node: NodeId,
    action: ScriptActionKind,
    callee: Option<Imsi>,
    bandwidth_kbps: Option<u32>,
    nsapi: Option<u8>,
    cell: Option<CellId>,
    quality: Option<u8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
config_version = "0.1"
seed = 42

[timers]
t3210 = 12.5
pdp_lifetime = 600

[limits]
num_channel_request_attempts = 3

[admission]
policy = "SimpleMaxUser"
max_users = 8

[[hlr]]
node = 1

[[gateway]]
node = 2

[[sc]]
node = 10
hlr = 1
gateway = 2

[[bs]]
node = 100
sc = 10
lac = 7
cells = [1, 2]

[[ms]]
node = 1000
imsi = 262011234567890
cell = 1

[[script]]
at = 1.5
node = 1000
action = "Call"
callee = 262011234567891
"#;

    #[test]
    fn test_parse_full_config() {
        let shared = from_toml_str(BASE).expect("valid config");
        let cfg = shared.config();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.timers.t3210, Duration::from_millis(12500));
        assert_eq!(cfg.timers.t3211, Duration::from_secs(15));
        assert_eq!(cfg.timers.pdp_lifetime, Some(Duration::from_secs(600)));
        assert_eq!(cfg.limits.num_channel_request_attempts, 3);
        assert_eq!(cfg.limits.max_location_update_attempts, 4);
        assert_eq!(cfg.admission.policy, AdmissionPolicyKind::SimpleMaxUser);
        assert_eq!(cfg.bss[0].channels, 10);
        assert_eq!(cfg.bs_for_cell(2).map(|b| b.node), Some(100));
        assert_eq!(cfg.script.len(), 1);
        assert_eq!(cfg.script[0].at, SimTime(1500));
        assert_eq!(
            cfg.script[0].action,
            ScriptAction::Call { callee: 262011234567891, bandwidth_kbps: 16 }
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let cfg = BASE.replace("[limits]", "[limits]\nmax_fun = 3");
        let err = from_toml_str(&cfg).err().expect("must fail");
        assert!(err.to_string().contains("max_fun"), "{}", err);

        let cfg = BASE.replace("seed = 42", "seed = 42\ncolour = 1");
        assert!(from_toml_str(&cfg).is_err());
    }

    #[test]
    fn test_invalid_enum_and_version_rejected() {
        let cfg = BASE.replace("\"SimpleMaxUser\"", "\"FirstComeFirstServed\"");
        assert!(from_toml_str(&cfg).is_err());

        let cfg = BASE.replace("config_version = \"0.1\"", "config_version = \"0.5\"");
        assert!(from_toml_str(&cfg).is_err());
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let cfg = BASE.replace("sc = 10", "sc = 11");
        let err = from_toml_str(&cfg).err().expect("must fail");
        assert!(err.to_string().contains("unknown sc"), "{}", err);

        let cfg = BASE.replace("callee = 262011234567891", "");
        assert!(from_toml_str(&cfg).is_err());
    }
}
