/// Plain-text rendering of a departure board
use crate::domain::{Board, Panel};
use crate::lookup::Lookup;
use std::fmt::Write;

pub const NOTHING_ACTIVE: &str = "No quick times active right now";
pub const NO_SERVICES: &str = "No services";

const HEADERS: [&str; 5] = ["Plat", "Sched", "Expected", "Destination", "Operator"];

pub fn render_board(board: &Board, lookup: &Lookup) -> String {
    if board.panels.is_empty() {
        return format!("{}\n", NOTHING_ACTIVE);
    }

    let mut out = String::new();
    for (idx, panel) in board.panels.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        render_panel(&mut out, panel, lookup);
    }
    out
}

fn render_panel(out: &mut String, panel: &Panel, lookup: &Lookup) {
    let rule = &panel.rule;
    let _ = writeln!(
        out,
        "{} to {}  ({}-{})",
        lookup.station_label(&rule.org),
        lookup.station_label(&rule.dest),
        rule.start,
        rule.end
    );

    if let Some(err) = &panel.error {
        let _ = writeln!(out, "Unable to fetch departures: {}", err);
        return;
    }
    if panel.services.is_empty() {
        let _ = writeln!(out, "{}", NO_SERVICES);
        return;
    }

    let rows: Vec<[String; 5]> = panel
        .services
        .iter()
        .map(|s| {
            [
                s.platform.clone(),
                s.std.clone(),
                s.etd.clone(),
                s.dest_name.clone(),
                lookup.operator_label(&s.operator_code).to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    write_row(out, &HEADERS.map(String::from), &widths);
    let rule_line: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule_line.join("-+-"));
    for row in &rows {
        write_row(out, row, &widths);
    }
}

fn write_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuickTime, TrainService};
    use chrono::{TimeZone, Utc};

    fn board(panels: Vec<Panel>) -> Board {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        Board {
            generated_at: now,
            local_time: now.naive_utc(),
            panels,
        }
    }

    fn panel(org: &str, dest: &str, services: Vec<TrainService>) -> Panel {
        Panel {
            rule: QuickTime {
                id: 1,
                start: "07:00".to_string(),
                end: "09:00".to_string(),
                org: org.to_string(),
                dest: dest.to_string(),
                days: vec![1],
            },
            services,
            error: None,
        }
    }

    fn service(platform: &str, toc: &str) -> TrainService {
        TrainService {
            std: "08:01".to_string(),
            etd: "On time".to_string(),
            platform: platform.to_string(),
            dest_crs: "PAD".to_string(),
            dest_name: "London Paddington".to_string(),
            operator: "Great Western Railway".to_string(),
            operator_code: toc.to_string(),
        }
    }

    #[test]
    fn test_nothing_active() {
        let lookup = Lookup::bundled().unwrap();
        assert_eq!(render_board(&board(Vec::new()), &lookup), format!("{}\n", NOTHING_ACTIVE));
    }

    #[test]
    fn test_table_rows_and_placeholders() {
        let lookup = Lookup::bundled().unwrap();
        let text = render_board(
            &board(vec![panel("RDG", "*", vec![service("?", "GW"), service("9", "ZZ")])]),
            &lookup,
        );
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Reading to Any Station  (07:00-09:00)");
        assert!(lines[1].starts_with("Plat | Sched | Expected | Destination"));
        assert_eq!(lines.len(), 5);
        assert!(lines[3].starts_with("?    | 08:01"));
        assert!(lines[3].ends_with("Great Western Railway"));
        assert!(lines[4].ends_with("Unknown operator"));
    }

    #[test]
    fn test_two_panels_unknown_station_and_errors() {
        let lookup = Lookup::bundled().unwrap();
        let mut failed = panel("TWY", "QQQ", Vec::new());
        failed.error = Some("HTTP Error Code 503".to_string());
        let text = render_board(&board(vec![panel("RDG", "PAD", Vec::new()), failed]), &lookup);

        assert_eq!(
            text,
            "Reading to London Paddington  (07:00-09:00)\n\
             No services\n\
             \n\
             Twyford to Unknown station  (07:00-09:00)\n\
             Unable to fetch departures: HTTP Error Code 503\n"
        );
    }
}
