//! Configuration directives embedded in the instruction stream
//!
//! Slicer start G-code can carry `;P2PP KEY=VALUE` comments that override
//! settings for the file being processed, and `;P2PP MATERIAL_...` lines
//! that define materials. Directives are matched and applied while the
//! first pass walks the stream.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::{BedSettings, Settings};
use crate::error::{DirectiveError, DirectiveResult};

/// Keys of the slicer profile that configure the device header, ping
/// generation or wipe motion rather than this processor
const PASSIVE_KEYS: [&str; 14] = [
    "PRINTERPROFILE",
    "PROFILETYPEVERSION",
    "CHECKVERSION",
    "GUI",
    "CONSOLEWAIT",
    "LINEARPING",
    "LINEARPINGLENGTH",
    "PALETTEPLUS",
    "PALETTEPLUS_PPM",
    "PALETTEPLUS_LOADINGOFFSET",
    "SIDEWIPELOC",
    "SIDEWIPEMINY",
    "SIDEWIPEMAXY",
    "SIDEWIPECORRECTION",
];

/// A configuration directive parsed from a comment line
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Upper-case directive key
    pub key: String,
    /// Raw value, trimmed; empty for flag directives
    pub value: String,
}

impl Directive {
    /// Match a comment line against the directive grammar
    pub fn parse(line: &str) -> Option<Self> {
        static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = DIRECTIVE_REGEX.get_or_init(|| {
            Regex::new(r"^;\s*P2PP\s+([^=\s]+)\s*=?\s*(.*)$").expect("invalid regex pattern")
        });

        let caps = regex.captures(line)?;
        Some(Self {
            key: caps[1].trim().to_uppercase(),
            value: caps[2].trim().to_string(),
        })
    }

    /// Whether this directive defines a material
    pub fn is_material(&self) -> bool {
        self.key.starts_with("MATERIAL")
    }

    fn number(&self) -> DirectiveResult<f64> {
        self.value
            .parse::<f64>()
            .map_err(|_| DirectiveError::InvalidValue {
                key: self.key.clone(),
                value: self.value.clone(),
            })
    }
}

impl Settings {
    /// Apply a directive to these settings
    pub fn apply_directive(&mut self, directive: &Directive) -> DirectiveResult<()> {
        if directive.is_material() {
            let definition = directive
                .key
                .strip_prefix("MATERIAL")
                .map(|rest| rest.trim_start_matches('_'))
                .unwrap_or_default();
            let definition = if directive.value.is_empty() {
                definition.to_string()
            } else {
                format!("{}={}", definition, directive.value)
            };
            self.materials.push(definition);
            return Ok(());
        }

        match directive.key.as_str() {
            "SPLICEOFFSET" => self.splice.splice_offset = directive.number()?,
            "MINSTARTSPLICE" => self.splice.min_start_splice_length = directive.number()?,
            "MINSPLICE" => self.splice.min_splice_length = directive.number()?,
            "EXTRAENDFILAMENT" => self.splice.extra_runout_filament = directive.number()?,
            "AUTOADDPURGE" => self.splice.autoadd_splice = true,
            "PURGETOPSPEED" => self.purge.purge_top_speed = directive.number()?,
            "MAXTOWERDELTA" => {
                self.purge.max_tower_z_delta = directive.number()?.abs();
                self.purge.tower_delta = self.purge.max_tower_z_delta > 0.0;
            }
            "FULLPURGEREDUCTION" => self.purge.full_purge_reduction = true,
            "SIDEWIPE" => self.purge.side_wipe = true,
            "BIGBRAIN3D_ENABLE" => self.purge.alternate_purge = true,
            "BIGBRAIN3D_PRIME" => self.purge.alternate_prime = directive.number()?,
            "BIGBRAIN3D_BLOBSIZE" => self.purge.alternate_blob_size = directive.number()?,
            "ACCESSORYMODE_MAF" | "ACCESSORYMODE_MSF" => self.device.accessory_mode = true,
            "TEMPERATURECONTROL" => self.device.process_temp = true,
            "DEBUGTOOLCHANGE" => self.device.debug_leave_tool_commands = true,
            "BEDORIGINX" => self.bed_mut().origin_x = directive.number()?,
            "BEDORIGINY" => self.bed_mut().origin_y = directive.number()?,
            "BEDSIZEX" => self.bed_mut().size_x = directive.number()?,
            "BEDSIZEY" => self.bed_mut().size_y = directive.number()?,
            "WIPEFEEDRATE" => self.printer.wipe_feedrate = directive.number()?,
            key if PASSIVE_KEYS.contains(&key) => {
                tracing::debug!(key, "Directive has no effect on processing");
                return Ok(());
            }
            _ => return Err(DirectiveError::UnknownKey(directive.key.clone())),
        }

        tracing::debug!(key = %directive.key, value = %directive.value, "Applied directive");
        Ok(())
    }

    fn bed_mut(&mut self) -> &mut BedSettings {
        self.printer.bed.get_or_insert_with(BedSettings::default)
    }
}
