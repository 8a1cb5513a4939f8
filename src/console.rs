use crate::board::Position;
use crate::game::Game;
use crate::movegen::GameState;
use anyhow::Result;
use log::info;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  e2e4                     play a move (start square then end square)
  moves                    list legal moves
  undo                     take back the last move
  board                    print the board
  log                      print the moves played so far
  position startpos [moves e2e4 ...]
                           reset and replay moves
  new                      start a new game
  quit                     exit
";

#[derive(Debug, Clone, Copy)]
pub struct ConsoleConfig {
    /// Print the board after every successful move or undo.
    pub show_board: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { show_board: true }
    }
}

/// Line-oriented front end: reads commands, answers with plain text.
pub struct Console {
    game: Game,
    config: ConsoleConfig,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> Self {
        Console {
            game: Game::new(),
            config,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    pub fn run_with<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> Result<()> {
        write!(writer, "{}", self.handle_board())?;
        writer.flush()?;
        let mut line = String::new();

        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();

            if command == "quit" {
                break;
            }
            write!(writer, "{}", self.handle_command(command))?;
            writer.flush()?;
            line.clear();
        }
        info!("console closed after {} moves", self.game.move_log().len());
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> String {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return "".to_string();
        }

        match parts[0] {
            "help" => HELP.to_string(),
            "new" => self.handle_new(),
            "moves" => self.handle_moves(),
            "undo" => self.handle_undo(),
            "board" => self.handle_board(),
            "log" => format!("{}\n", self.game.move_log().join(" ")),
            "position" => self.handle_position(&parts[1..]),
            mv => self.handle_move(mv),
        }
    }

    fn handle_new(&mut self) -> String {
        self.game = Game::new();
        self.handle_board()
    }

    fn handle_moves(&self) -> String {
        let mut moves: Vec<String> = self
            .game
            .legal_moves()
            .iter()
            .map(|mv| mv.to_string())
            .collect();
        moves.sort();
        format!("{}\n", moves.join(" "))
    }

    fn handle_undo(&mut self) -> String {
        match self.game.undo() {
            Some(mv) => format!("took back {mv}\n{}", self.after_change()),
            None => "nothing to undo\n".to_string(),
        }
    }

    fn handle_board(&self) -> String {
        format!("{}\n{}", self.game.position(), self.status_line())
    }

    fn handle_position(&mut self, parts: &[&str]) -> String {
        if parts.first() != Some(&"startpos") {
            return "error: expected `position startpos [moves ...]`\n".to_string();
        }
        // Replayed on a fresh game; the current one is kept unless every move is legal.
        let mut game = Game::from_position(Position::new());
        if parts.get(1) == Some(&"moves") {
            for (index, move_str) in parts[2..].iter().enumerate() {
                if let Err(e) = game.play_notation(move_str) {
                    return format!("error: move {} ({move_str}): {e}, position unchanged\n", index + 1);
                }
            }
        }
        self.game = game;
        self.after_change()
    }

    fn handle_move(&mut self, move_str: &str) -> String {
        match self.game.play_notation(move_str) {
            Ok(_) => self.after_change(),
            Err(e) => format!("error: {e}\n"),
        }
    }

    fn after_change(&self) -> String {
        if self.config.show_board {
            self.handle_board()
        } else {
            self.status_line()
        }
    }

    fn status_line(&self) -> String {
        match self.game.state() {
            GameState::Ongoing => format!("{:?} to move\n", self.game.position().side_to_move()),
            GameState::Check(color) => format!("{color:?} to move, in check\n"),
            GameState::Checkmate(winner) => format!("checkmate, {winner:?} wins\n"),
            GameState::Stalemate => "stalemate\n".to_string(),
        }
    }
}
