//! External units and the FLUSH statement.
//!
//! Architecture: a process-wide [`UnitTable`] maps unit numbers to
//! [`ExternalUnit`]s. Units 0, 5 and 6 are preconnected to stderr, stdin and
//! stdout. A statement is begun against a unit number ([`begin_flush`]),
//! optionally given handler specifiers ([`enable_handlers`]), and ended
//! ([`end_io_statement`]); ending executes it. An error that no enabled
//! handler covers is fatal through the statement's [`Terminator`].

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, OnceLock, TryLockError};

use crate::terminator::Terminator;

pub const STDERR_UNIT: i32 = 0;
pub const STDIN_UNIT: i32 = 5;
pub const STDOUT_UNIT: i32 = 6;

pub const IOSTAT_OK: i32 = 0;
pub const IOSTAT_GENERIC_ERROR: i32 = 1000;
pub const IOSTAT_BAD_FLUSH_UNIT: i32 = 1001;
pub const IOSTAT_BAD_UNIT_NUMBER: i32 = 1002;
pub const IOSTAT_NOT_CONNECTED: i32 = 1003;
pub const IOSTAT_READ_ONLY_UNIT: i32 = 1004;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Result of an I/O statement, as an IOSTAT= variable would receive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iostat {
    Ok,
    /// FLUSH named a negative unit.
    BadFlushUnit(i32),
    /// CONNECT named a negative unit.
    BadUnitNumber(i32),
    NotConnected(i32),
    /// Output requested on an input-only unit.
    ReadOnlyUnit(i32),
    /// The unit's sink rejected a write or flush.
    WriteFailed { unit: i32, os_error: Option<i32> },
}

impl Iostat {
    /// IOSTAT= value. Sink failures report the OS error number when known.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Ok => IOSTAT_OK,
            Self::BadFlushUnit(_) => IOSTAT_BAD_FLUSH_UNIT,
            Self::BadUnitNumber(_) => IOSTAT_BAD_UNIT_NUMBER,
            Self::NotConnected(_) => IOSTAT_NOT_CONNECTED,
            Self::ReadOnlyUnit(_) => IOSTAT_READ_ONLY_UNIT,
            Self::WriteFailed { os_error, .. } => os_error.unwrap_or(IOSTAT_GENERIC_ERROR),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Iostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("No error"),
            Self::BadFlushUnit(unit) => write!(f, "FLUSH: unit number {unit} is negative"),
            Self::BadUnitNumber(unit) => write!(f, "unit number {unit} is negative"),
            Self::NotConnected(unit) => write!(f, "unit {unit} is not connected"),
            Self::ReadOnlyUnit(unit) => write!(f, "unit {unit} is connected for input only"),
            Self::WriteFailed {
                unit,
                os_error: Some(errno),
            } => write!(f, "write to unit {unit} failed (os error {errno})"),
            Self::WriteFailed {
                unit,
                os_error: None,
            } => write!(f, "write to unit {unit} failed"),
        }
    }
}

impl std::error::Error for Iostat {}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A connected unit: direction, sink, and output not yet handed to the sink.
pub struct ExternalUnit {
    number: i32,
    direction: Direction,
    pending: Vec<u8>,
    sink: Option<Box<dyn Write + Send>>,
}

impl fmt::Debug for ExternalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalUnit")
            .field("number", &self.number)
            .field("direction", &self.direction)
            .field("pending", &self.pending.len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl ExternalUnit {
    pub fn output(number: i32, sink: Box<dyn Write + Send>) -> Self {
        Self {
            number,
            direction: Direction::Output,
            pending: Vec::new(),
            sink: Some(sink),
        }
    }

    #[must_use]
    pub fn input(number: i32) -> Self {
        Self {
            number,
            direction: Direction::Input,
            pending: Vec::new(),
            sink: None,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Hands pending output to the sink and flushes it. Pending bytes are kept
    /// when the sink fails.
    fn flush_pending(&mut self) -> Result<(), Iostat> {
        if self.direction == Direction::Input {
            return Ok(());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let unit = self.number;
        let failed = |e: std::io::Error| Iostat::WriteFailed {
            unit,
            os_error: e.raw_os_error(),
        };
        if !self.pending.is_empty() {
            sink.write_all(&self.pending).map_err(failed)?;
            self.pending.clear();
        }
        sink.flush().map_err(failed)
    }
}

/// Unit number to unit map.
#[derive(Debug, Default)]
pub struct UnitTable {
    units: HashMap<i32, ExternalUnit>,
}

impl UnitTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with stderr, stdin and stdout connected to their standard units.
    #[must_use]
    pub fn preconnected() -> Self {
        let mut units = HashMap::new();
        units.insert(
            STDERR_UNIT,
            ExternalUnit::output(STDERR_UNIT, Box::new(std::io::stderr())),
        );
        units.insert(STDIN_UNIT, ExternalUnit::input(STDIN_UNIT));
        units.insert(
            STDOUT_UNIT,
            ExternalUnit::output(STDOUT_UNIT, Box::new(std::io::stdout())),
        );
        Self { units }
    }

    /// Connects `unit`, returning whatever was connected under its number.
    /// The displaced unit is not flushed.
    pub fn connect(&mut self, unit: ExternalUnit) -> Result<Option<ExternalUnit>, Iostat> {
        if unit.number < 0 {
            return Err(Iostat::BadUnitNumber(unit.number));
        }
        Ok(self.units.insert(unit.number, unit))
    }

    pub fn disconnect(&mut self, number: i32) -> Option<ExternalUnit> {
        self.units.remove(&number)
    }

    #[must_use]
    pub fn is_connected(&self, number: i32) -> bool {
        self.units.contains_key(&number)
    }

    #[must_use]
    pub fn pending_len(&self, number: i32) -> Option<usize> {
        self.units.get(&number).map(|u| u.pending.len())
    }

    /// Buffers `bytes` plus a record terminator on `number`.
    pub fn write_record(&mut self, number: i32, bytes: &[u8]) -> Result<(), Iostat> {
        let Some(unit) = self.units.get_mut(&number) else {
            return Err(Iostat::NotConnected(number));
        };
        if unit.direction == Direction::Input {
            return Err(Iostat::ReadOnlyUnit(number));
        }
        unit.pending.extend_from_slice(bytes);
        unit.pending.push(b'\n');
        Ok(())
    }

    /// FLUSH semantics: a negative unit is an error, an unconnected one is a
    /// no-op, and the unit stays connected either way.
    pub fn flush_unit(&mut self, number: i32) -> Result<(), Iostat> {
        if number < 0 {
            return Err(Iostat::BadFlushUnit(number));
        }
        match self.units.get_mut(&number) {
            Some(unit) => unit.flush_pending(),
            None => Ok(()),
        }
    }

    /// Flushes every unit, reporting the first failure after trying all.
    pub fn flush_all(&mut self) -> Result<(), Iostat> {
        let mut first_error = None;
        for unit in self.units.values_mut() {
            if let Err(err) = unit.flush_pending() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

static UNITS: OnceLock<Mutex<UnitTable>> = OnceLock::new();

/// The process-wide unit table.
///
/// Nothing flushes it at normal process exit: records still pending when the
/// program ends without a FLUSH are dropped. Only the crash path flushes
/// every unit.
pub fn unit_table() -> &'static Mutex<UnitTable> {
    UNITS.get_or_init(|| Mutex::new(UnitTable::preconnected()))
}

/// Locks `table`, recovering from poisoning.
pub fn lock_units(table: &Mutex<UnitTable>) -> MutexGuard<'_, UnitTable> {
    table.lock().unwrap_or_else(|e| e.into_inner())
}

/// Best-effort flush of all units ahead of a crash. Skipped when the table was
/// never created or is locked by the crashing statement.
pub(crate) fn flush_output_on_crash() {
    let Some(table) = UNITS.get() else {
        return;
    };
    let mut guard = match table.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => return,
    };
    let _ = guard.flush_all();
}

// ---------------------------------------------------------------------------
// Statement protocol
// ---------------------------------------------------------------------------

/// Handler specifiers attached to a statement. IOSTAT= or ERR= turns an
/// error into a returned status; END= and EOR= never apply to FLUSH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoHandlers {
    pub iostat: bool,
    pub err: bool,
    pub end: bool,
    pub eor: bool,
    pub iomsg: bool,
}

impl IoHandlers {
    #[must_use]
    pub fn handles_error(&self) -> bool {
        self.iostat || self.err
    }
}

/// An in-flight FLUSH statement.
#[derive(Debug)]
pub struct Cookie<'t> {
    table: &'t Mutex<UnitTable>,
    unit: i32,
    handlers: IoHandlers,
    terminator: Terminator,
}

/// Begins `FLUSH(unit)` against the process-wide table.
pub fn begin_flush(unit: i32, terminator: Terminator) -> Cookie<'static> {
    begin_flush_in(unit_table(), unit, terminator)
}

/// Begins `FLUSH(unit)` against `table`.
pub fn begin_flush_in(table: &Mutex<UnitTable>, unit: i32, terminator: Terminator) -> Cookie<'_> {
    Cookie {
        table,
        unit,
        handlers: IoHandlers::default(),
        terminator,
    }
}

pub fn enable_handlers(cookie: &mut Cookie<'_>, handlers: IoHandlers) {
    cookie.handlers = handlers;
}

/// Executes and completes the statement.
///
/// Without IOSTAT= or ERR= an error crashes the process; with them the error
/// is returned.
pub fn end_io_statement(cookie: Cookie<'_>) -> Iostat {
    let result = lock_units(cookie.table).flush_unit(cookie.unit);
    match result {
        Ok(()) => Iostat::Ok,
        Err(iostat) if cookie.handlers.handles_error() => iostat,
        Err(iostat) => cookie.terminator.crash(format_args!("{iostat}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from_raw_os_error(28))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn table_with(unit: i32, sink: SharedSink) -> Mutex<UnitTable> {
        let mut table = UnitTable::new();
        table
            .connect(ExternalUnit::output(unit, Box::new(sink)))
            .expect("non-negative unit");
        Mutex::new(table)
    }

    fn handled() -> IoHandlers {
        IoHandlers {
            iostat: true,
            ..IoHandlers::default()
        }
    }

    #[test]
    fn flush_moves_pending_output_to_sink_and_keeps_unit_open() {
        let sink = SharedSink::default();
        let table = table_with(10, sink.clone());
        lock_units(&table).write_record(10, b"hello").unwrap();
        assert!(sink.contents().is_empty());

        let cookie = begin_flush_in(&table, 10, Terminator::here());
        assert_eq!(end_io_statement(cookie), Iostat::Ok);

        assert_eq!(sink.contents(), b"hello\n");
        let guard = lock_units(&table);
        assert!(guard.is_connected(10));
        assert_eq!(guard.pending_len(10), Some(0));
    }

    #[test]
    fn flush_of_unconnected_unit_is_a_no_op() {
        let table = Mutex::new(UnitTable::new());
        let cookie = begin_flush_in(&table, 42, Terminator::here());
        assert_eq!(end_io_statement(cookie), Iostat::Ok);
        assert!(!lock_units(&table).is_connected(42));
    }

    #[test]
    fn flush_of_input_unit_succeeds() {
        let mut table = UnitTable::new();
        table.connect(ExternalUnit::input(STDIN_UNIT)).unwrap();
        assert_eq!(table.flush_unit(STDIN_UNIT), Ok(()));
    }

    #[test]
    fn negative_unit_is_returned_when_iostat_is_handled() {
        let table = Mutex::new(UnitTable::new());
        let mut cookie = begin_flush_in(&table, -1, Terminator::here());
        enable_handlers(&mut cookie, handled());
        let stat = end_io_statement(cookie);
        assert_eq!(stat, Iostat::BadFlushUnit(-1));
        assert_eq!(stat.code(), IOSTAT_BAD_FLUSH_UNIT);
    }

    #[test]
    fn sink_failure_keeps_pending_bytes() {
        let mut table = UnitTable::new();
        table
            .connect(ExternalUnit::output(7, Box::new(BrokenSink)))
            .unwrap();
        table.write_record(7, b"lost?").unwrap();
        let table = Mutex::new(table);

        let mut cookie = begin_flush_in(&table, 7, Terminator::here());
        enable_handlers(
            &mut cookie,
            IoHandlers {
                err: true,
                ..IoHandlers::default()
            },
        );
        let stat = end_io_statement(cookie);
        assert_eq!(
            stat,
            Iostat::WriteFailed {
                unit: 7,
                os_error: Some(28)
            }
        );
        assert_eq!(stat.code(), 28);
        assert_eq!(lock_units(&table).pending_len(7), Some(6));
    }

    #[test]
    fn iomsg_alone_does_not_handle_errors() {
        let handlers = IoHandlers {
            iomsg: true,
            end: true,
            eor: true,
            ..IoHandlers::default()
        };
        assert!(!handlers.handles_error());
        assert!(handled().handles_error());
    }

    #[test]
    fn write_record_checks_connection_and_direction() {
        let mut table = UnitTable::new();
        assert_eq!(table.write_record(3, b"x"), Err(Iostat::NotConnected(3)));
        table.connect(ExternalUnit::input(3)).unwrap();
        assert_eq!(table.write_record(3, b"x"), Err(Iostat::ReadOnlyUnit(3)));
    }

    #[test]
    fn connect_rejects_negative_and_returns_displaced_unit() {
        let mut table = UnitTable::new();
        assert_eq!(
            table.connect(ExternalUnit::input(-4)).err(),
            Some(Iostat::BadUnitNumber(-4))
        );
        assert!(table.connect(ExternalUnit::input(4)).unwrap().is_none());
        let displaced = table
            .connect(ExternalUnit::output(4, Box::new(SharedSink::default())))
            .unwrap()
            .expect("unit 4 was connected");
        assert_eq!(displaced.direction(), Direction::Input);
        assert!(table.disconnect(4).is_some());
        assert!(!table.is_connected(4));
    }

    #[test]
    fn flush_all_tries_every_unit() {
        let good = SharedSink::default();
        let mut table = UnitTable::new();
        table
            .connect(ExternalUnit::output(1, Box::new(BrokenSink)))
            .unwrap();
        table
            .connect(ExternalUnit::output(2, Box::new(good.clone())))
            .unwrap();
        table.write_record(1, b"a").unwrap();
        table.write_record(2, b"b").unwrap();

        assert!(table.flush_all().is_err());
        assert_eq!(good.contents(), b"b\n");
    }

    #[test]
    fn preconnected_table_has_standard_units() {
        let table = UnitTable::preconnected();
        for unit in [STDERR_UNIT, STDIN_UNIT, STDOUT_UNIT] {
            assert!(table.is_connected(unit), "unit {unit}");
        }
        assert!(!table.is_connected(1));
    }

    #[test]
    fn iostat_messages_name_the_unit() {
        assert_eq!(
            Iostat::BadFlushUnit(-3).to_string(),
            "FLUSH: unit number -3 is negative"
        );
        assert_eq!(
            Iostat::WriteFailed {
                unit: 9,
                os_error: None
            }
            .to_string(),
            "write to unit 9 failed"
        );
        assert!(Iostat::Ok.is_ok());
    }
}
