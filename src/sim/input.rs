//! Token-stream input feed.
//!
//! ```text
//! NCORES 2
//! START 0   PID 1   CORE 100  SSD 20  CORE 10
//! START 40  PID 2   CORE 30   TTY 500 CORE 5
//! END
//! ```
//!
//! Markers and values are separated by any whitespace. Anything after `END`
//! is ignored.

use std::str::FromStr;

use anyhow::{Context, Result, bail, ensure};

use super::job::{ProcessDef, Workload};
use crate::core::state::{Instruction, Resource};

pub fn parse_workload(text: &str) -> Result<Workload> {
    let mut tokens = text.split_ascii_whitespace();

    let header = tokens.next().context("input is empty")?;
    ensure!(header == "NCORES", "input must start with NCORES, found {header:?}");
    let max_cores: usize = parse_value("NCORES", tokens.next())?;
    ensure!(max_cores > 0, "NCORES must be at least 1");

    let mut processes = Vec::new();
    let mut current: Option<ProcessDef> = None;

    loop {
        let Some(marker) = tokens.next() else {
            bail!("input ended without END");
        };
        match marker {
            "END" => break,
            "START" => {
                let arrival = parse_value("START", tokens.next())?;
                match tokens.next() {
                    Some("PID") => {}
                    Some(other) => bail!("START {arrival} must be followed by PID, found {other:?}"),
                    None => bail!("START {arrival} is missing its PID"),
                }
                let pid = parse_value("PID", tokens.next())?;
                processes.extend(current.replace(ProcessDef::new(pid, arrival)));
            }
            "PID" => bail!("PID without a preceding START"),
            other => {
                let resource: Resource = other.parse()?;
                let duration = parse_value(other, tokens.next())?;
                let process = current
                    .as_mut()
                    .with_context(|| format!("{other} {duration} appears before the first START"))?;
                process.instructions.push(Instruction { resource, duration });
            }
        }
    }
    processes.extend(current);

    let workload = Workload {
        max_cores,
        processes,
    };
    workload.validate()?;
    Ok(workload)
}

fn parse_value<T>(marker: &str, token: Option<&str>) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let token = token.with_context(|| format!("{marker} is missing its value"))?;
    token
        .parse()
        .with_context(|| format!("{marker} value {token:?} is not a valid number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_two_processes() {
        let input = "NCORES 2\n\
                     START 0 PID 1 CORE 100 SSD 20 CORE 10\n\
                     START 40 PID 2 CORE 30 TTY 500 CORE 5\n\
                     END";
        let workload = parse_workload(input).unwrap();
        assert_eq!(workload.max_cores, 2);
        assert_eq!(
            workload.processes,
            vec![
                ProcessDef::new(1, 0).core(100).ssd(20).core(10),
                ProcessDef::new(2, 40).core(30).tty(500).core(5),
            ]
        );
    }

    #[test]
    fn trailing_value_after_end_is_ignored() {
        let workload = parse_workload("NCORES 1 START 5 PID 3 CORE 1 END 0").unwrap();
        assert_eq!(workload.processes, vec![ProcessDef::new(3, 5).core(1)]);
    }

    #[test]
    fn empty_instruction_list_is_accepted() {
        let workload = parse_workload("NCORES 1 START 5 PID 3 START 6 PID 4 CORE 2 END").unwrap();
        assert!(workload.processes[0].instructions.is_empty());
        assert_eq!(workload.processes.len(), 2);
    }

    #[test]
    fn unknown_marker() {
        let err = parse_workload("NCORES 1 START 0 PID 1 GPU 10 END").unwrap_err();
        assert!(err.to_string().contains("unknown resource marker"), "{err}");
    }

    #[test]
    fn missing_pid() {
        let err = parse_workload("NCORES 1 START 0 CORE 10 END").unwrap_err();
        assert!(err.to_string().contains("must be followed by PID"), "{err}");
    }

    #[test]
    fn instruction_before_start() {
        let err = parse_workload("NCORES 1 CORE 10 END").unwrap_err();
        assert!(err.to_string().contains("before the first START"), "{err}");
    }

    #[test]
    fn not_a_number() {
        let err = parse_workload("NCORES 1 START 0 PID 1 CORE ten END").unwrap_err();
        assert!(err.to_string().contains("not a valid number"), "{err}");
    }

    #[test]
    fn missing_end() {
        let err = parse_workload("NCORES 1 START 0 PID 1 CORE 10").unwrap_err();
        assert!(err.to_string().contains("without END"), "{err}");
    }

    #[test]
    fn zero_cores() {
        let err = parse_workload("NCORES 0 END").unwrap_err();
        assert!(err.to_string().contains("at least 1"), "{err}");
    }

    #[test]
    fn bad_sequence_is_rejected() {
        let err = parse_workload("NCORES 1 START 0 PID 1 CORE 5 CORE 5 END").unwrap_err();
        assert!(err.to_string().contains("CORE right after another CORE"), "{err}");
    }
}
