//! Interactive console prompts.
//!
//! [`Prompter`] is generic over its input and output so the same code drives
//! the terminal in the binary and an in-memory buffer in tests. Invalid
//! answers are never fatal: the question is simply asked again. Running out
//! of input is reported as [`io::ErrorKind::UnexpectedEof`].

use std::io::{self, BufRead, Write};

use chrono::{Datelike, NaiveDate};

use crate::calendar::days_in_month;

/// Reads answers from `input` and writes questions to `output`.
pub struct Prompter<R, W> {
  input:  R,
  output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
  /// A prompter bound to the process's stdin and stdout.
  pub fn stdio() -> Self { Self::new(io::stdin().lock(), io::stdout()) }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
  pub fn new(input: R, output: W) -> Self { Self { input, output } }

  pub fn into_inner(self) -> (R, W) { (self.input, self.output) }

  /// Ask a yes/no question.
  ///
  /// Accepts `yes`, `ye`, `y`, `no` and `n` in any case. Unless `require` is
  /// set, an empty answer counts as yes.
  pub fn yes_no(&mut self, prompt: &str, require: bool) -> io::Result<bool> {
    loop {
      write!(self.output, "{prompt} (Yes/No) ")?;
      let choice = self.read_line()?.to_lowercase();
      match choice.as_str() {
        "yes" | "ye" | "y" => return Ok(true),
        "no" | "n" => return Ok(false),
        "" if !require => return Ok(true),
        _ => writeln!(self.output, "Please respond with 'yes' or 'no'")?,
      }
    }
  }

  /// Ask for an integer, optionally bounded by `min` and `max`.
  ///
  /// An empty answer takes the default. Answers outside the bounds are
  /// clamped. A fractional answer such as `12.8` is not accepted directly;
  /// its truncated value becomes the default and the question is repeated.
  pub fn int(
    &mut self,
    prompt: &str,
    mut default: Option<i64>,
    min: Option<i64>,
    max: Option<i64>,
  ) -> io::Result<i64> {
    loop {
      default = default.map(|d| clamp(d, min, max));

      write!(self.output, "{prompt}")?;
      if let Some(d) = default {
        write!(self.output, " ({d})")?;
      }
      write!(self.output, " ")?;

      let answer = self.read_line()?;
      if answer.is_empty() {
        match default {
          Some(d) => return Ok(d),
          None => continue,
        }
      }

      let answer = answer.trim();
      if let Ok(value) = answer.parse::<i64>() {
        return Ok(clamp(value, min, max));
      }
      if let Ok(value) = answer.parse::<f64>()
        && value.is_finite()
      {
        default = Some(value.trunc() as i64);
      }
    }
  }

  /// Ask for a calendar date one component at a time.
  ///
  /// Each component defaults to the matching component of `default`. The
  /// default day is pulled back to the last day of the chosen month, so a
  /// default of 2016-02-29 becomes 2015-02-28 once the year 2015 is picked.
  pub fn date(
    &mut self,
    prompt: &str,
    default: Option<NaiveDate>,
  ) -> io::Result<NaiveDate> {
    writeln!(self.output, "{prompt}")?;

    // Four-digit years only; filed paths are named `{year:04}`.
    let year = self.int(
      "Year",
      default.map(|d| i64::from(d.year())),
      Some(1),
      Some(9999),
    )? as i32;
    let month = self.int(
      "Month",
      default.map(|d| i64::from(d.month())),
      Some(1),
      Some(12),
    )? as u32;

    let last = days_in_month(year, month);
    let day = self.int(
      "Day",
      default.map(|d| i64::from(d.day().min(last))),
      Some(1),
      Some(i64::from(last)),
    )? as u32;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{year:04}-{month:02}-{day:02} is not a calendar date"),
      )
    })
  }

  fn read_line(&mut self) -> io::Result<String> {
    self.output.flush()?;
    let mut line = String::new();
    if self.input.read_line(&mut line)? == 0 {
      return Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "input closed while waiting for an answer",
      ));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_owned())
  }
}

fn clamp(value: i64, min: Option<i64>, max: Option<i64>) -> i64 {
  let value = min.map_or(value, |m| value.max(m));
  max.map_or(value, |m| value.min(m))
}
