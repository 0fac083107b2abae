use anyhow::Result;
use faultline_algo::{FaultResults, ResultStatus};
use std::io::Write;
use tabwriter::TabWriter;

pub fn write_table<W: Write>(out: W, results: &FaultResults) -> Result<()> {
    let mut writer = TabWriter::new(out);
    writeln!(writer, "FAULT\tTYPE\tBUS\tSTATUS\tIK (kA)\tICC (A)\tPCC (MVA)")?;
    for (id, result) in results.iter() {
        let bus = result
            .locations
            .iter()
            .map(|location| location.bus_name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.3}\t{:.1}\t{:.2}",
            id,
            result.fault_type,
            bus,
            status_label(result.status),
            result.ik_ka,
            result.icc_a,
            result.pcc_mva
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut out: W, results: &FaultResults) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, results)?;
    writeln!(out)?;
    Ok(())
}

fn status_label(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Ok => "ok",
        ResultStatus::SingularLocation => "singular",
        ResultStatus::DuplicatePair => "duplicate",
    }
}
