use anyhow::{bail, Context, Result};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;
use frukit_core::area::{
    build_board_area, build_chassis_area, build_product_area, BoardInfo, ChassisInfo, MfgDate,
    ProductInfo,
};
use frukit_core::constants::{FRU_VERSION, LANG_ENGLISH, SMBIOS_CHASSIS_UNKNOWN};
use frukit_core::container::{build_container, AreaSet};
use frukit_core::multirecord::{build_multirecord_area, uuid_to_mgmt_record};
use frukit_core::{EncodingConfig, TypedField};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

/// Date format accepted for the board manufacturing timestamp (UTC)
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A field in the JSON document: a plain string (auto-encoded) or an
/// explicit `{ "type": ..., "data": ... }` object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// Bare string, encoding detected from content
    Plain(String),
    /// Explicitly typed field
    Typed(TypedField),
}

impl FieldSpec {
    /// Convert into the core field type
    pub fn into_field(self) -> TypedField {
        match self {
            FieldSpec::Plain(s) => TypedField::auto(s),
            FieldSpec::Typed(f) => f,
        }
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::Plain(String::new())
    }
}

fn field(spec: &Option<FieldSpec>) -> TypedField {
    spec.clone().unwrap_or_default().into_field()
}

fn customs(specs: &[FieldSpec]) -> Vec<TypedField> {
    specs.iter().cloned().map(FieldSpec::into_field).collect()
}

/// Chassis section of the JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisDoc {
    /// SMBIOS chassis type byte
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub chassis_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pn: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<FieldSpec>,
}

/// Board section of the JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<u8>,
    /// Manufacturing date as "YYYY-MM-DD HH:MM:SS" (UTC), omitted for
    /// unspecified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfg: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pname: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pn: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<FieldSpec>,
}

/// Product section of the JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfg: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pname: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pn: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atag: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FieldSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<FieldSpec>,
}

/// MultiRecord section of the JSON document
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiRecordDoc {
    /// System UUID, dashed or plain hex form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Top-level JSON document describing a FRU image
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FruDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis: Option<ChassisDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multirecord: Option<MultiRecordDoc>,
    /// Internal use area payload as a hex string, passed through raw
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
}

/// Build the five container slots from a parsed document
pub fn areas_from_document(doc: &FruDocument, config: &EncodingConfig) -> Result<AreaSet> {
    let mut areas = AreaSet::default();

    if let Some(internal) = &doc.internal {
        let data = hex::decode(internal).context("Bad hex in the internal use area")?;
        let mut buf = BytesMut::with_capacity(1 + data.len());
        buf.put_u8(FRU_VERSION);
        buf.put_slice(&data);
        areas.internal = Some(buf.freeze());
    }

    if let Some(chassis) = &doc.chassis {
        let info = ChassisInfo {
            chassis_type: chassis.chassis_type.unwrap_or(SMBIOS_CHASSIS_UNKNOWN),
            pn: field(&chassis.pn),
            serial: field(&chassis.serial),
            custom: customs(&chassis.custom),
        };
        areas.chassis =
            Some(build_chassis_area(&info, config).context("Failed to build the chassis area")?);
    }

    if let Some(board) = &doc.board {
        let date = match &board.date {
            None => MfgDate::Unspecified,
            Some(s) => {
                let parsed = NaiveDateTime::parse_from_str(s, DATE_FORMAT)
                    .with_context(|| format!("Bad manufacturing date {:?}", s))?;
                MfgDate::from_unix_seconds(parsed.and_utc().timestamp())
                    .context("Manufacturing date out of range")?
            }
        };
        let info = BoardInfo {
            lang: board.lang.unwrap_or(LANG_ENGLISH),
            date,
            mfg: field(&board.mfg),
            pname: field(&board.pname),
            serial: field(&board.serial),
            pn: field(&board.pn),
            file: field(&board.file),
            custom: customs(&board.custom),
        };
        areas.board =
            Some(build_board_area(&info, config).context("Failed to build the board area")?);
    }

    if let Some(product) = &doc.product {
        let info = ProductInfo {
            lang: product.lang.unwrap_or(LANG_ENGLISH),
            mfg: field(&product.mfg),
            pname: field(&product.pname),
            pn: field(&product.pn),
            ver: field(&product.ver),
            serial: field(&product.serial),
            atag: field(&product.atag),
            file: field(&product.file),
            custom: customs(&product.custom),
        };
        areas.product =
            Some(build_product_area(&info, config).context("Failed to build the product area")?);
    }

    if let Some(mr) = &doc.multirecord {
        if let Some(uuid) = &mr.uuid {
            let record = uuid_to_mgmt_record(uuid).context("Bad system UUID")?;
            areas.multirecord = Some(
                build_multirecord_area(&[record])
                    .context("Failed to build the multirecord area")?,
            );
        }
    }

    Ok(areas)
}

pub fn execute(input: &str, output: &str, no_autodetect: bool) -> Result<()> {
    info!("Generating FRU image from {} to {}", input, output);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;
    let doc: FruDocument =
        serde_json::from_str(&content).with_context(|| "Failed to parse JSON input")?;

    let config = EncodingConfig {
        autodetect: !no_autodetect,
    };

    let areas = areas_from_document(&doc, &config)?;
    if areas.chassis.is_none()
        && areas.board.is_none()
        && areas.product.is_none()
        && areas.multirecord.is_none()
        && areas.internal.is_none()
    {
        bail!("The input document describes no areas at all");
    }

    let fru: Bytes = build_container(&areas).context("Failed to assemble the FRU container")?;

    fs::write(output, &fru).with_context(|| format!("Failed to write output file: {}", output))?;

    info!("Wrote {} bytes to {}", fru.len(), output);
    Ok(())
}
