//! Human-readable and CSV renderings of pipeline results

use std::io::Write;

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::helpers::truncate_str;
use crate::core::geometry::{format_coord, point_token};
use crate::entities::anomaly::{Anomaly, Severity};
use crate::entities::component::Component;

/// Message column width in tables
const MESSAGE_WIDTH: usize = 72;

#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "SEVERITY")]
    severity: Severity,
    #[tabled(rename = "RULE")]
    rule: String,
    #[tabled(rename = "REFNO")]
    refno: String,
    #[tabled(rename = "#")]
    ordinal: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

/// Flat CSV record; detail pairs are joined as `key=value;...`
#[derive(Serialize)]
struct AnomalyRecord<'a> {
    id: &'a str,
    severity: Severity,
    rule: &'a str,
    refno: &'a str,
    ordinal: Option<usize>,
    message: &'a str,
    detail: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "REFNO")]
    refno: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "FROM")]
    from: String,
    #[tabled(rename = "TO")]
    to: String,
    #[tabled(rename = "LENGTH")]
    length: String,
}

pub fn anomaly_table<'a>(anomalies: impl IntoIterator<Item = &'a Anomaly>) -> String {
    let rows: Vec<AnomalyRow> = anomalies
        .into_iter()
        .map(|a| AnomalyRow {
            severity: a.severity,
            rule: a.rule.clone(),
            refno: a.refno.clone(),
            ordinal: a.ordinal.map(|o| o.to_string()).unwrap_or_default(),
            message: truncate_str(&a.message, MESSAGE_WIDTH),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn write_anomalies_csv<'a, W: Write>(
    writer: W,
    anomalies: impl IntoIterator<Item = &'a Anomaly>,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for a in anomalies {
        let detail = a
            .detail
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";");
        wtr.serialize(AnomalyRecord {
            id: &a.id,
            severity: a.severity,
            rule: &a.rule,
            refno: &a.refno,
            ordinal: a.ordinal,
            message: &a.message,
            detail,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Components listed in the given refno order
pub fn component_table(components: &[Component], order: &[String]) -> String {
    let rows: Vec<ComponentRow> = order
        .iter()
        .filter_map(|refno| components.iter().find(|c| &c.refno == refno))
        .enumerate()
        .map(|(i, c)| {
            let (from, to) = match c.endpoints() {
                Some((a, b)) => (point_token(&a, None), point_token(&b, None)),
                None => (
                    c.centre()
                        .map(|p| point_token(&p.pos, None))
                        .unwrap_or_default(),
                    String::new(),
                ),
            };
            ComponentRow {
                position: i + 1,
                refno: c.refno.clone(),
                kind: c.kind.to_string(),
                from,
                to,
                length: c.length().map(format_coord).unwrap_or_default(),
            }
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Anomaly> {
        vec![
            Anomaly::new(Severity::Warning, "DISCONNECTED", "P-1", "neither endpoint connects")
                .at(4)
                .with_detail("distance", "500")
                .with_detail("nearest_refno", "P-2"),
            Anomaly::new(Severity::Info, "OPEN_END", "P-2", "endpoint 2 is open, really, truly"),
        ]
    }

    #[test]
    fn test_anomaly_table_lists_rows() {
        let table = anomaly_table(&sample());
        assert!(table.contains("DISCONNECTED"));
        assert!(table.contains("warning"));
        assert!(table.contains("REFNO"));
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_anomalies_csv(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,severity,rule,refno,ordinal,message,detail")
        );
        assert_eq!(
            lines.next(),
            Some("DISCONNECTED:P-1,warning,DISCONNECTED,P-1,4,neither endpoint connects,distance=500;nearest_refno=P-2")
        );
        assert_eq!(
            lines.next(),
            Some("OPEN_END:P-2,info,OPEN_END,P-2,,\"endpoint 2 is open, really, truly\",")
        );
    }
}
