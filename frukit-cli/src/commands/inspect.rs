use anyhow::{Context, Result};
use chrono::DateTime;
use colored::*;
use frukit_core::area::{
    parse_board_area, parse_chassis_area, parse_product_area, AreaKind, BoardInfo, ChassisInfo,
    MfgDate, ProductInfo,
};
use frukit_core::constants::{BLOCK_SIZE, FRU_VERSION, MR_MGMT_ACCESS, MR_MGMT_SYS_UUID, UUID_SIZE};
use frukit_core::container::{info_area_slice, parse_container, raw_area_slice};
use frukit_core::multirecord::{parse_multirecord_area, MrRecord};
use frukit_core::{FieldEncoding, TypedField};
use std::fs;
use tracing::info;

use super::generate::{
    BoardDoc, ChassisDoc, FieldSpec, FruDocument, MultiRecordDoc, ProductDoc, DATE_FORMAT,
};

fn field_to_spec(field: &TypedField) -> Option<FieldSpec> {
    if field.is_empty() {
        return None;
    }
    match field.encoding {
        FieldEncoding::Binary => Some(FieldSpec::Typed(field.clone())),
        _ => Some(FieldSpec::Plain(field.value.clone())),
    }
}

fn date_to_string(date: MfgDate) -> Option<String> {
    let secs = date.to_unix_seconds()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format(DATE_FORMAT).to_string())
}

/// Render a System UUID management access record back into dashed hex
fn record_to_uuid(record: &MrRecord) -> Option<String> {
    if record.type_id != MR_MGMT_ACCESS
        || record.payload.len() != 1 + UUID_SIZE
        || record.payload[0] != MR_MGMT_SYS_UUID
    {
        return None;
    }

    let mut raw = [0u8; UUID_SIZE];
    raw.copy_from_slice(&record.payload[1..]);
    // Undo the little-endian storage of the first three groups
    raw[0..4].reverse();
    raw[4..6].reverse();
    raw[6..8].reverse();

    let hex = hex::encode_upper(raw);
    Some(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

fn print_field(label: &str, field: &TypedField) {
    if field.is_empty() {
        return;
    }
    let shown = match field.encoding {
        FieldEncoding::Binary => format!("{} {}", field.value, "(binary)".dimmed()),
        _ => field.value.clone(),
    };
    println!("{:<16}{}", format!("{}:", label), shown);
}

fn print_chassis(chassis: &ChassisInfo) {
    println!("\n=== Chassis Area ===");
    println!("{:<16}{:#04x}", "Type:", chassis.chassis_type);
    print_field("Part number", &chassis.pn);
    print_field("Serial", &chassis.serial);
    for (i, field) in chassis.custom.iter().enumerate() {
        print_field(&format!("Custom {}", i + 1), field);
    }
}

fn print_board(board: &BoardInfo) {
    println!("\n=== Board Area ===");
    println!("{:<16}{}", "Language:", board.lang);
    match date_to_string(board.date) {
        Some(date) => println!("{:<16}{}", "Mfg date:", date),
        None => println!("{:<16}{}", "Mfg date:", "unspecified".dimmed()),
    }
    print_field("Manufacturer", &board.mfg);
    print_field("Product name", &board.pname);
    print_field("Serial", &board.serial);
    print_field("Part number", &board.pn);
    print_field("File ID", &board.file);
    for (i, field) in board.custom.iter().enumerate() {
        print_field(&format!("Custom {}", i + 1), field);
    }
}

fn print_product(product: &ProductInfo) {
    println!("\n=== Product Area ===");
    println!("{:<16}{}", "Language:", product.lang);
    print_field("Manufacturer", &product.mfg);
    print_field("Product name", &product.pname);
    print_field("Part number", &product.pn);
    print_field("Version", &product.ver);
    print_field("Serial", &product.serial);
    print_field("Asset tag", &product.atag);
    print_field("File ID", &product.file);
    for (i, field) in product.custom.iter().enumerate() {
        print_field(&format!("Custom {}", i + 1), field);
    }
}

pub fn execute(input: &str, json_output: Option<&str>) -> Result<()> {
    info!("Inspecting FRU image: {}", input);

    let data = fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;

    let header = parse_container(&data).context("Invalid FRU container header")?;

    println!("\n=== FRU Container ===");
    println!(
        "{:<16}{} bytes ({} blocks)",
        "Size:",
        data.len(),
        data.len() / BLOCK_SIZE
    );
    println!("{:<16}{} valid", "Header:", "✓".green());

    let mut doc = FruDocument::default();

    if let Some(slice) = raw_area_slice(&data, AreaKind::InternalUse)
        .context("Bad internal use area extent")?
    {
        println!("\n=== Internal Use Area ===");
        if slice.first() != Some(&FRU_VERSION) {
            println!("{} Unrecognized internal area version", "!".yellow());
        }
        let payload = &slice[1..];
        println!("{:<16}{} bytes", "Data:", payload.len());
        doc.internal = Some(hex::encode_upper(payload));
    }

    if let Some(slice) =
        info_area_slice(&data, AreaKind::Chassis).context("Invalid chassis area")?
    {
        let chassis = parse_chassis_area(slice).context("Failed to decode the chassis area")?;
        print_chassis(&chassis);
        doc.chassis = Some(ChassisDoc {
            chassis_type: Some(chassis.chassis_type),
            pn: field_to_spec(&chassis.pn),
            serial: field_to_spec(&chassis.serial),
            custom: chassis.custom.iter().filter_map(field_to_spec).collect(),
        });
    }

    if let Some(slice) = info_area_slice(&data, AreaKind::Board).context("Invalid board area")? {
        let board = parse_board_area(slice).context("Failed to decode the board area")?;
        print_board(&board);
        doc.board = Some(BoardDoc {
            lang: Some(board.lang),
            date: date_to_string(board.date),
            mfg: field_to_spec(&board.mfg),
            pname: field_to_spec(&board.pname),
            serial: field_to_spec(&board.serial),
            pn: field_to_spec(&board.pn),
            file: field_to_spec(&board.file),
            custom: board.custom.iter().filter_map(field_to_spec).collect(),
        });
    }

    if let Some(slice) =
        info_area_slice(&data, AreaKind::Product).context("Invalid product area")?
    {
        let product = parse_product_area(slice).context("Failed to decode the product area")?;
        print_product(&product);
        doc.product = Some(ProductDoc {
            lang: Some(product.lang),
            mfg: field_to_spec(&product.mfg),
            pname: field_to_spec(&product.pname),
            pn: field_to_spec(&product.pn),
            ver: field_to_spec(&product.ver),
            serial: field_to_spec(&product.serial),
            atag: field_to_spec(&product.atag),
            file: field_to_spec(&product.file),
            custom: product.custom.iter().filter_map(field_to_spec).collect(),
        });
    }

    if let Some(slice) = raw_area_slice(&data, AreaKind::MultiRecord)
        .context("Bad multirecord area extent")?
    {
        let records = parse_multirecord_area(slice).context("Invalid multirecord area")?;
        println!("\n=== MultiRecord Area ===");
        println!("{:<16}{}", "Records:", records.len());
        for record in &records {
            match record_to_uuid(record) {
                Some(uuid) => {
                    println!("{:<16}{}", "System UUID:", uuid);
                    doc.multirecord = Some(MultiRecordDoc { uuid: Some(uuid) });
                }
                None => println!(
                    "{:<16}type {:#04x}, {} bytes",
                    "Record:",
                    record.type_id,
                    record.payload.len()
                ),
            }
        }
    }

    let present = [
        header.internal,
        header.chassis,
        header.board,
        header.product,
        header.multirecord,
    ]
    .iter()
    .filter(|&&o| o > 0)
    .count();
    println!(
        "\n{} All checksums valid ({} areas present)",
        "✓".green(),
        present
    );

    if let Some(path) = json_output {
        let json =
            serde_json::to_string_pretty(&doc).context("Failed to serialize the JSON export")?;
        fs::write(path, json).with_context(|| format!("Failed to write JSON file: {}", path))?;
        info!("JSON export written to: {}", path);
    }

    Ok(())
}
