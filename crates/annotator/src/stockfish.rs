//! Stockfish engine wrapper using UCI protocol (async I/O)

use async_trait::async_trait;
use shakmaty::{Chess, Move, Position};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use chess_core::notation;

use crate::engine::{AnalysisLine, Analyzer, SearchLimit};
use crate::error::AnnotatorError;
use crate::score::{PositionScore, Score};

/// Latest score and pv (UCI) reported for one multipv slot
type RawLine = (Score, Vec<String>);

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// MultiPV value currently set in the engine
    multipv: u32,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, threads: u32, hash_mb: u32) -> Result<Self, AnnotatorError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| AnnotatorError::Engine(format!("Failed to spawn Stockfish at {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnnotatorError::Engine("Stockfish stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| AnnotatorError::Engine("Stockfish stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            multipv: 1,
        };

        // Initialize UCI
        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        // Configure for analysis
        engine.send(&format!("setoption name Threads value {threads}")).await?;
        engine.send(&format!("setoption name Hash value {hash_mb}")).await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), AnnotatorError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnnotatorError::Engine(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnnotatorError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed output line; the engine closing its output is an error
    async fn read_line(&mut self) -> Result<String, AnnotatorError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| AnnotatorError::Engine(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(AnnotatorError::Engine("Stockfish exited unexpectedly".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), AnnotatorError> {
        loop {
            let line = self.read_line().await?;
            debug!(line = %line, "SF >");
            if line == expected {
                return Ok(());
            }
        }
    }

    async fn set_multipv(&mut self, multipv: u32) -> Result<(), AnnotatorError> {
        if multipv != self.multipv {
            self.send(&format!("setoption name MultiPV value {multipv}")).await?;
            self.multipv = multipv;
        }
        Ok(())
    }

    /// Run one search and keep the last info line of every multipv slot
    async fn search(
        &mut self,
        fen: &str,
        multipv: u32,
        limit: SearchLimit,
    ) -> Result<Vec<RawLine>, AnnotatorError> {
        self.set_multipv(multipv).await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.go_command()).await?;

        let mut slots: Vec<Option<RawLine>> = vec![None; multipv as usize];

        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" score ") {
                // Parse multipv index (1-based)
                let idx = parse_multipv_index(&line).unwrap_or(1).max(1) as usize - 1;
                if let (Some(slot), Some(score)) = (slots.get_mut(idx), parse_score(&line)) {
                    *slot = Some((score, parse_pv(&line)));
                }
            } else if line.starts_with("bestmove") {
                debug!(line = %line, "SF >");
                break;
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

#[async_trait]
impl Analyzer for StockfishEngine {
    async fn analyze(
        &mut self,
        pos: &Chess,
        multipv: u32,
        limit: SearchLimit,
    ) -> Result<Vec<AnalysisLine>, AnnotatorError> {
        let fen = notation::fen(pos);
        let raw = self.search(&fen, multipv.max(1), limit).await?;
        if raw.is_empty() {
            return Err(AnnotatorError::EmptyAnalysis(fen));
        }

        let turn = pos.turn();
        Ok(raw
            .into_iter()
            .map(|(score, pv)| AnalysisLine {
                score: PositionScore::from_relative(score, turn),
                pv: pv_moves(pos, &pv),
            })
            .collect())
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Parse the score (relative to the side to move) from an info line
fn parse_score(line: &str) -> Option<Score> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "score" && i + 2 < parts.len() {
            let value: i32 = parts[i + 2].parse().ok()?;
            return match parts[i + 1] {
                "cp" => Some(Score::Cp(value)),
                "mate" => Some(Score::from_uci_mate(value)),
                _ => None,
            };
        }
    }
    None
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "multipv" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

/// Replay a UCI pv from `pos`, stopping at the first move that does not apply
fn pv_moves(pos: &Chess, pv: &[String]) -> Vec<Move> {
    let mut pos = pos.clone();
    let mut moves = Vec::with_capacity(pv.len());

    for text in pv {
        match notation::parse_uci(&pos, text) {
            Ok(mv) => {
                pos.play_unchecked(mv);
                moves.push(mv);
            }
            Err(e) => {
                debug!(error = %e, "Truncating engine pv");
                break;
            }
        }
    }

    moves
}
