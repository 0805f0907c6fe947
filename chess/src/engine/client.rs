use super::process::{self, Lines};
use super::{position_command, EngineError, EngineOptions};
use crate::moves::Move;
use crate::session::GameSession;
use crate::turn::Opponent;

use std::io::{self, Read, Write};
use std::process::Child;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, info, trace, warn};

const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Connection to a UCI engine
///
/// The handshake is performed on creation. Dropping the engine sends `quit` to it; if the engine
/// runs as a child process, it's given a short time to exit and killed afterwards.
///
/// If waiting for `bestmove` fails, the search is considered unfinished. Before the next query,
/// the engine is told to `stop` and its late `bestmove` is skipped, so each reply always belongs
/// to the position it was asked for.
pub struct Engine {
    writer: Box<dyn Write + Send>,
    lines: Lines,
    child: Option<Child>,
    options: EngineOptions,
    searching: bool,
}

impl Engine {
    /// Starts the engine process and performs the handshake
    pub fn spawn(options: EngineOptions) -> Result<Engine, EngineError> {
        let (mut child, stdin, stdout) = process::spawn(&options.path)?;
        info!(path = %options.path.display(), pid = child.id(), "engine started");
        let lines = match process::spawn_reader(stdout) {
            Ok(lines) => lines,
            Err(e) => {
                process::shutdown(&mut child, Duration::ZERO);
                return Err(e.into());
            }
        };
        Engine::with_parts(Box::new(stdin), lines, Some(child), options)
    }

    /// Talks to the engine over arbitrary streams and performs the handshake
    ///
    /// `writer` receives the commands, and `reader` provides the engine output.
    pub fn from_streams<W, R>(
        writer: W,
        reader: R,
        options: EngineOptions,
    ) -> Result<Engine, EngineError>
    where
        W: Write + Send + 'static,
        R: Read + Send + 'static,
    {
        let lines = process::spawn_reader(reader)?;
        Engine::with_parts(Box::new(writer), lines, None, options)
    }

    fn with_parts(
        writer: Box<dyn Write + Send>,
        lines: Lines,
        child: Option<Child>,
        options: EngineOptions,
    ) -> Result<Engine, EngineError> {
        let mut engine = Engine {
            writer,
            lines,
            child,
            options,
            searching: false,
        };
        engine.handshake()?;
        Ok(engine)
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.wait_for("uciok", |line| line == "uciok")?;
        self.send("ucinewgame")?;
        self.send("isready")?;
        self.wait_for("readyok", |line| line == "readyok")?;
        info!("engine is ready");
        Ok(())
    }

    /// Finishes the search left over from a failed query
    fn resync(&mut self) -> Result<(), EngineError> {
        if !self.searching {
            return Ok(());
        }
        self.send("stop")?;
        let line = self.wait_for("bestmove", |line| line.starts_with("bestmove"))?;
        debug!(line, "skipped stale engine reply");
        self.searching = false;
        Ok(())
    }

    fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        trace!(cmd, "engine <-");
        writeln!(self.writer, "{}", cmd)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Reads lines until the one matching `pred`, which is returned
    fn wait_for(
        &mut self,
        expected: &'static str,
        pred: impl Fn(&str) -> bool,
    ) -> Result<String, EngineError> {
        let deadline = self.options.timeout.map(|t| (Instant::now() + t, t));
        loop {
            let line = match deadline {
                Some((deadline, after)) => {
                    self.lines.recv_deadline(deadline).map_err(|e| match e {
                        RecvTimeoutError::Timeout => EngineError::Timeout { expected, after },
                        RecvTimeoutError::Disconnected => EngineError::Closed { expected },
                    })?
                }
                None => self
                    .lines
                    .recv()
                    .map_err(|_| EngineError::Closed { expected })?,
            }?;
            let line = line.trim_end();
            trace!(line, "engine ->");
            if pred(line) {
                return Ok(line.to_owned());
            }
        }
    }

    /// Asks the engine for the best move in the game played so far
    ///
    /// The position is sent as the sequence of moves from the initial position. The moved piece
    /// is looked up on the current board of `session`, so the source square must be occupied;
    /// the move is not checked for legality.
    pub fn best_move(&mut self, session: &GameSession) -> Result<Move, EngineError> {
        self.resync()?;
        self.send(&position_command(session.history()))?;
        self.searching = true;
        self.send(&format!("go depth {}", self.options.depth))?;
        let line = self.wait_for("bestmove", |line| line.starts_with("bestmove"))?;
        self.searching = false;
        let text = match line.split_whitespace().nth(1) {
            None | Some("(none)") | Some("0000") => return Err(EngineError::NoMove),
            Some(text) => text,
        };
        let mv = Move::from_uci(text, session.board()).map_err(|source| EngineError::BadMove {
            text: text.to_owned(),
            source,
        })?;
        debug!(%mv, "engine replied");
        Ok(mv)
    }
}

impl Opponent for Engine {
    fn reply(&mut self, session: &GameSession) -> Result<Move, EngineError> {
        self.best_move(session)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.send("quit") {
            warn!(error = %e, "cannot send quit to engine");
        }
        // Closes the engine input
        self.writer = Box::new(io::sink());
        if let Some(mut child) = self.child.take() {
            process::shutdown(&mut child, QUIT_GRACE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::uci;
    use crate::types::{Cell, Color, Piece};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Reader which blocks until the paired sender is dropped
    struct Stall(crossbeam_channel::Receiver<()>);

    impl Read for Stall {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn options() -> EngineOptions {
        EngineOptions {
            depth: 7,
            timeout: Some(Duration::from_secs(5)),
            ..EngineOptions::new("fake")
        }
    }

    fn scripted(output: &str) -> (Result<Engine, EngineError>, SharedBuf) {
        let input = SharedBuf::default();
        let engine = Engine::from_streams(
            input.clone(),
            Cursor::new(output.as_bytes().to_vec()),
            options(),
        );
        (engine, input)
    }

    fn after_e2e4() -> GameSession {
        let mut s = GameSession::new();
        s.make_move("e2".parse().unwrap(), "e4".parse().unwrap())
            .unwrap();
        s
    }

    #[test]
    fn test_query() {
        let (engine, input) = scripted(
            "id name Fake\r\nid author nobody\r\nuciok\r\nreadyok\r\n\
             info depth 1 score cp 13\r\nbestmove e7e5 ponder g1f3\r\n",
        );
        let mut engine = engine.unwrap();
        assert_eq!(input.text(), "uci\nucinewgame\nisready\n");

        let mv = engine.best_move(&after_e2e4()).unwrap();
        assert_eq!(mv.to_string(), "e7e5");
        assert_eq!(mv.cell(), Cell::from_parts(Color::Black, Piece::Pawn));
        assert_eq!(
            input.text(),
            "uci\nucinewgame\nisready\nposition startpos moves e2e4 \ngo depth 7\n"
        );

        drop(engine);
        assert!(input.text().ends_with("go depth 7\nquit\n"));
    }

    #[test]
    fn test_no_move() {
        let (engine, _) =
            scripted("uciok\nreadyok\nbestmove (none)\nbestmove 0000\nbestmove\n");
        let mut engine = engine.unwrap();
        let s = after_e2e4();
        for _ in 0..3 {
            assert!(matches!(engine.best_move(&s), Err(EngineError::NoMove)));
        }
    }

    #[test]
    fn test_bad_move() {
        let (engine, _) = scripted("uciok\nreadyok\nbestmove e4e5\nbestmove e7e8q\n");
        let mut engine = engine.unwrap();
        let s = GameSession::new();
        match engine.best_move(&s) {
            Err(EngineError::BadMove { text, source }) => {
                assert_eq!(text, "e4e5");
                assert!(matches!(source, uci::ParseError::Create(_)));
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.to_string())),
        }
        match engine.best_move(&s) {
            Err(EngineError::BadMove { text, source }) => {
                assert_eq!(text, "e7e8q");
                assert_eq!(source, uci::ParseError::Parse(uci::RawParseError::BadLength));
            }
            other => panic!("unexpected result: {:?}", other.map(|m| m.to_string())),
        }
    }

    #[test]
    fn test_closed() {
        let (engine, _) = scripted("uciok\n");
        assert!(matches!(
            engine,
            Err(EngineError::Closed {
                expected: "readyok"
            })
        ));
    }

    #[test]
    fn test_timeout() {
        let (_tx, rx) = crossbeam_channel::bounded::<()>(0);
        let options = EngineOptions {
            timeout: Some(Duration::from_millis(50)),
            ..EngineOptions::new("fake")
        };
        let started = Instant::now();
        let res = Engine::from_streams(io::sink(), Stall(rx), options);
        assert!(matches!(
            res,
            Err(EngineError::Timeout {
                expected: "uciok",
                ..
            })
        ));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    /// Reader which yields the chunks sent by the test, blocking between them
    struct Feed {
        chunks: crossbeam_channel::Receiver<&'static str>,
        cur: Cursor<&'static [u8]>,
    }

    impl Read for Feed {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                let n = self.cur.read(buf)?;
                if n != 0 || buf.is_empty() {
                    return Ok(n);
                }
                match self.chunks.recv() {
                    Ok(chunk) => self.cur = Cursor::new(chunk.as_bytes()),
                    Err(_) => return Ok(0),
                }
            }
        }
    }

    #[test]
    fn test_late_reply() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let feed = Feed {
            chunks: rx,
            cur: Cursor::new(&b""[..]),
        };
        let input = SharedBuf::default();
        let options = EngineOptions {
            timeout: Some(Duration::from_millis(50)),
            ..EngineOptions::new("fake")
        };
        tx.send("uciok\nreadyok\n").unwrap();
        let mut engine = Engine::from_streams(input.clone(), feed, options).unwrap();

        let mut s = after_e2e4();
        assert!(matches!(
            engine.best_move(&s),
            Err(EngineError::Timeout {
                expected: "bestmove",
                ..
            })
        ));

        // The reply to the first query arrives after the timeout. It's also legal in the next
        // position, so it must not be taken as the answer to the second query.
        tx.send("bestmove g8f6\n").unwrap();
        s.make_move("d7".parse().unwrap(), "d5".parse().unwrap())
            .unwrap();
        s.make_move("d2".parse().unwrap(), "d4".parse().unwrap())
            .unwrap();
        tx.send("info depth 1\nbestmove c7c5\n").unwrap();
        let mv = engine.best_move(&s).unwrap();
        assert_eq!(mv.to_string(), "c7c5");
        assert_eq!(
            input.text(),
            "uci\nucinewgame\nisready\n\
             position startpos moves e2e4 \ngo depth 10\n\
             stop\n\
             position startpos moves e2e4 d7d5 d2d4 \ngo depth 10\n"
        );

        // Nothing is pending after a successful query
        tx.send("bestmove e7e5\n").unwrap();
        let s = after_e2e4();
        assert_eq!(engine.best_move(&s).unwrap().to_string(), "e7e5");
        assert_eq!(input.text().matches("stop").count(), 1);
    }

    #[test]
    fn test_stale_reply_missing() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let feed = Feed {
            chunks: rx,
            cur: Cursor::new(&b""[..]),
        };
        let options = EngineOptions {
            timeout: Some(Duration::from_millis(50)),
            ..EngineOptions::new("fake")
        };
        tx.send("uciok\nreadyok\n").unwrap();
        let mut engine = Engine::from_streams(io::sink(), feed, options).unwrap();
        let s = after_e2e4();
        for _ in 0..2 {
            assert!(matches!(
                engine.best_move(&s),
                Err(EngineError::Timeout {
                    expected: "bestmove",
                    ..
                })
            ));
        }
        tx.send("bestmove g8f6\nbestmove e7e5\n").unwrap();
        assert_eq!(engine.best_move(&s).unwrap().to_string(), "e7e5");
    }

    #[test]
    fn test_spawn_missing() {
        let res = Engine::spawn(EngineOptions::new("/nonexistent/duelchess-engine"));
        assert!(matches!(res, Err(EngineError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        const SCRIPT: &str = "#!/bin/sh\n\
            while read -r line; do\n\
              case \"$line\" in\n\
                uci) echo 'id name Fake'; echo uciok ;;\n\
                isready) echo readyok ;;\n\
                go*) echo 'info depth 1'; echo 'bestmove e7e5' ;;\n\
                quit) exit 0 ;;\n\
              esac\n\
            done\n";

        let path = std::env::temp_dir().join(format!(
            "duelchess-fake-engine-{}",
            std::process::id()
        ));
        fs::write(&path, SCRIPT).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();

        let mut engine = Engine::spawn(options_for(&path)).unwrap();
        let mv = engine.best_move(&after_e2e4()).unwrap();
        assert_eq!(mv.to_string(), "e7e5");
        drop(engine);

        fs::remove_file(&path).unwrap();
    }

    #[cfg(unix)]
    fn options_for(path: &std::path::Path) -> EngineOptions {
        EngineOptions {
            path: path.to_owned(),
            ..options()
        }
    }
}
