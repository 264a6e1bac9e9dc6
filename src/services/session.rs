//! Console session: feeds typed lines and elapsed time into one game and
//! routes finished games through the score prompt.

use std::{
    future::{self, Future},
    io::{self, Write},
    time::Duration,
};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    time::{self, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    commands::{Command, HELP},
    config::{AppConfig, ScoreSettings},
    dao::score_store::ScoreStore,
    presentation::console::{ConsolePresenter, format_score_table},
    services::{
        score_prompt::{PromptAnswer, PromptOutcome, PromptStage, ScorePrompt},
        score_service::{DeleteRequest, PendingDeletion, ScoreBoard, timestamp_now},
    },
    state::{SimonGame, game::GameOverReport},
};

/// Typed in place of a name to dismiss the score prompt.
pub const CANCEL_ANSWER: &str = "/cancel";

/// Whether the session wants more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep reading.
    Continue,
    /// The player asked to leave.
    Quit,
}

/// What the next typed line answers.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Playing,
    Prompt(ScorePrompt),
    ConfirmDelete(PendingDeletion),
    ConfirmReset,
}

/// One player at one console.
pub struct Session<S, W: Write> {
    game: SimonGame<ConsolePresenter<W>>,
    board: ScoreBoard<S>,
    settings: ScoreSettings,
    mode: Mode,
}

impl<S: ScoreStore, W: Write> Session<S, W> {
    /// Build a session with a random-step game writing to `out`.
    pub fn new(config: &AppConfig, board: ScoreBoard<S>, out: W) -> Self {
        let game = SimonGame::with_timer_queue(config.game.clone(), ConsolePresenter::new(out));
        Self::with_game(game, board, config.scores.clone())
    }

    /// Build a session around an existing game.
    pub fn with_game(
        game: SimonGame<ConsolePresenter<W>>,
        board: ScoreBoard<S>,
        settings: ScoreSettings,
    ) -> Self {
        Self {
            game,
            board,
            settings,
            mode: Mode::Playing,
        }
    }

    /// The game being played.
    pub fn game(&self) -> &SimonGame<ConsolePresenter<W>> {
        &self.game
    }

    /// The score list.
    pub fn board(&self) -> &ScoreBoard<S> {
        &self.board
    }

    /// Whether typed lines currently answer a question rather than issue commands.
    pub fn awaiting_answer(&self) -> bool {
        self.mode != Mode::Playing
    }

    /// Let `elapsed` pass on the game clock.
    pub fn tick(&mut self, elapsed: Duration) {
        self.game.advance(elapsed);
        self.check_game_over();
    }

    /// Move the game clock to `now`, measured from when the session started.
    pub fn advance_to(&mut self, now: Duration) {
        if now > self.game.now() {
            self.game.advance_to(now);
        }
        self.check_game_over();
    }

    /// Handle one typed line.
    pub fn handle_line(&mut self, line: &str) -> Control {
        let control = match std::mem::replace(&mut self.mode, Mode::Playing) {
            Mode::Playing => self.handle_command(line),
            Mode::Prompt(prompt) => {
                self.answer_prompt(prompt, line);
                Control::Continue
            }
            Mode::ConfirmDelete(pending) => {
                if is_yes(line) {
                    match self.board.confirm_delete(pending) {
                        Ok(removed) => self.say(&format!("Deleted {}.", removed.name)),
                        Err(err) => self.say(&format!("error: {err}")),
                    }
                } else {
                    self.say("Kept.");
                }
                Control::Continue
            }
            Mode::ConfirmReset => {
                if is_yes(line) {
                    self.board.reset_scores();
                    self.say("Scores cleared.");
                } else {
                    self.say("Kept.");
                }
                Control::Continue
            }
        };

        self.check_game_over();
        control
    }

    /// Read lines from `input` until it ends, the player quits or `shutdown` resolves,
    /// firing game timers in real time in between.
    pub async fn run<R, F>(&mut self, input: R, shutdown: F) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let origin = Instant::now() - self.game.now();
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        self.say("Simon. Type `start` to play, `help` for commands.");
        loop {
            let deadline = self.game.next_deadline().map(|at| origin + at);
            tokio::select! {
                line = lines.next_line() => {
                    self.advance_to(origin.elapsed());
                    let Some(line) = line? else {
                        debug!("input closed");
                        break;
                    };
                    if self.handle_line(&line) == Control::Quit {
                        break;
                    }
                }
                () = wait_until(deadline) => self.advance_to(origin.elapsed()),
                () = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.game.stop_game();
        Ok(())
    }

    fn handle_command(&mut self, line: &str) -> Control {
        if line.trim().is_empty() {
            return Control::Continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                self.say(&format!("error: {err} (try `help`)"));
                return Control::Continue;
            }
        };

        match command {
            Command::Start => {
                self.say("Get ready...");
                self.game.start_new_game();
            }
            Command::Stop => {
                self.game.stop_game();
                self.say("Stopped.");
            }
            Command::Press(button) => {
                self.game.on_button_down(button);
                self.game.on_button_pressed(button);
            }
            Command::Down(button) => self.game.on_button_down(button),
            Command::Up(button) => self.game.on_button_pressed(button),
            Command::Scores => self.show_scores(None),
            Command::Delete(index) => match self.board.request_delete(index) {
                Ok(DeleteRequest::Deleted(removed)) => {
                    self.say(&format!("Deleted {}.", removed.name));
                }
                Ok(DeleteRequest::NeedsConfirmation(pending)) => {
                    self.say(&format!(
                        "Delete {} ({} points)? [y/n]",
                        pending.entry().name,
                        pending.entry().points
                    ));
                    self.mode = Mode::ConfirmDelete(pending);
                }
                Err(err) => self.say(&format!("error: {err}")),
            },
            Command::Reset => {
                self.say("Clear every score? [y/n]");
                self.mode = Mode::ConfirmReset;
            }
            Command::Help => self.say(HELP),
            Command::Quit => {
                self.game.stop_game();
                return Control::Quit;
            }
        }
        Control::Continue
    }

    fn answer_prompt(&mut self, prompt: ScorePrompt, line: &str) {
        let text = line.trim();
        let answer = if text.eq_ignore_ascii_case(CANCEL_ANSWER) {
            PromptAnswer::Cancel
        } else if prompt.stage() == PromptStage::ConfirmDiscard {
            match text.to_ascii_lowercase().as_str() {
                "y" | "yes" => PromptAnswer::Yes,
                "n" | "no" => PromptAnswer::No,
                _ => PromptAnswer::Name(text.to_string()),
            }
        } else {
            PromptAnswer::Name(text.to_string())
        };

        match prompt.respond(answer) {
            PromptOutcome::Continue(next) => {
                self.say(&next.question());
                self.mode = Mode::Prompt(next);
            }
            PromptOutcome::Save(entry) => {
                self.game.take_game_over();
                let rank = self
                    .board
                    .record_score(entry.points, entry.name, entry.timestamp);
                self.show_scores(Some(rank));
            }
            PromptOutcome::Discard => {
                self.game.take_game_over();
                self.say("Score discarded.");
            }
        }
    }

    /// Open the score prompt as soon as a game ends.
    fn check_game_over(&mut self) {
        if self.mode != Mode::Playing {
            return;
        }
        let Some(report) = self.game.game_over_report().copied() else {
            return;
        };
        self.open_prompt(&report);
    }

    fn open_prompt(&mut self, report: &GameOverReport) {
        info!(game_id = %report.game_id, points = report.points, "asking for a name");
        let prompt = ScorePrompt::new(report, timestamp_now(), &self.settings);
        self.say(&format!(
            "{}\n(type {CANCEL_ANSWER} to skip)",
            prompt.question()
        ));
        self.mode = Mode::Prompt(prompt);
    }

    fn show_scores(&mut self, highlight: Option<usize>) {
        let table = format_score_table(self.board.list_scores(), highlight);
        self.say(table.trim_end());
        if let Err(err) = self.board.writable() {
            self.say(&format!("note: {err}"));
        }
    }

    fn say(&mut self, text: &str) {
        let out = self.game.presenter_mut().writer_mut();
        if let Err(err) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            warn!(error = %err, "failed to write to console");
        }
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GameSettings,
        dao::score_store::MemoryStore,
        state::{
            ButtonId, RoundPhase,
            scheduler::TimerQueue,
            sequence::ScriptedSteps,
        },
    };

    type TestSession = Session<MemoryStore, Vec<u8>>;

    fn session(steps: &[u8]) -> TestSession {
        let game = SimonGame::new(
            GameSettings::default(),
            ConsolePresenter::new(Vec::new()),
            TimerQueue::new(),
            Box::new(ScriptedSteps::new(
                steps.iter().map(|&value| ButtonId::new(value).unwrap()),
            )),
        );
        let board = ScoreBoard::load(MemoryStore::new(), 2);
        Session::with_game(game, board, ScoreSettings::default())
    }

    fn output(session: &TestSession) -> String {
        String::from_utf8(session.game().presenter().writer().clone()).unwrap()
    }

    fn run_until_turn(session: &mut TestSession) {
        for _ in 0..200 {
            if session.game().phase() == RoundPhase::AwaitingInput {
                return;
            }
            let deadline = session.game().next_deadline().expect("a timer should be pending");
            session.advance_to(deadline);
        }
        panic!("player turn never started");
    }

    /// Play until the sequence holds `length` steps, then press a wrong button.
    fn lose_at_length(session: &mut TestSession, length: usize) {
        assert_eq!(session.handle_line("start"), Control::Continue);
        run_until_turn(session);
        while session.game().sequence().len() < length {
            let answer = session.game().sequence().to_vec();
            for button in answer {
                session.handle_line(&button.to_string());
            }
            run_until_turn(session);
        }
        let expected = session.game().sequence()[0].value();
        session.handle_line(&((expected + 1) % 4).to_string());
    }

    fn points(session: &TestSession) -> Vec<u32> {
        session
            .board()
            .list_scores()
            .iter()
            .map(|entry| entry.points)
            .collect()
    }

    #[test]
    fn named_score_is_recorded_and_highlighted() {
        let mut session = session(&[0, 1, 2, 3, 0]);
        lose_at_length(&mut session, 4);

        assert!(session.awaiting_answer());
        assert!(output(&session).contains("GAME OVER - SCORE 3"));

        session.handle_line("Ada");
        assert!(!session.awaiting_answer());
        assert_eq!(session.game().phase(), RoundPhase::Idle);
        assert_eq!(points(&session), vec![3]);
        assert_eq!(session.board().list_scores()[0].name, "Ada");
        assert!(output(&session).contains("> 1       3  Ada"));
    }

    #[test]
    fn cancelled_good_score_can_still_be_saved() {
        let mut session = session(&[0, 1, 2, 3, 0]);
        lose_at_length(&mut session, 4);

        session.handle_line("/cancel");
        assert!(output(&session).contains("throw out your score of 3"));
        session.handle_line("n");
        assert!(output(&session).contains("LAST CHANCE!"));
        session.handle_line("/cancel");

        assert_eq!(session.board().list_scores()[0].name, "Anonymous");
        assert_eq!(session.game().phase(), RoundPhase::Idle);
    }

    #[test]
    fn cancelled_low_score_is_discarded() {
        let mut session = session(&[2, 2]);
        lose_at_length(&mut session, 2);

        session.handle_line("/cancel");
        assert!(output(&session).contains("Score discarded."));
        assert!(session.board().list_scores()[0].is_placeholder());
    }

    #[test]
    fn inactivity_opens_the_prompt() {
        let mut session = session(&[1]);
        session.handle_line("start");
        run_until_turn(&mut session);

        session.tick(Duration::from_secs(5));
        assert!(session.awaiting_answer());
        assert!(output(&session).contains("BZZZT"));
        assert!(output(&session).contains("GAME OVER - SCORE 0"));
    }

    #[test]
    fn commands_are_rejected_with_a_hint() {
        let mut session = session(&[]);
        assert_eq!(session.handle_line("dance"), Control::Continue);
        assert!(output(&session).contains("unknown command `dance` (try `help`)"));
        assert_eq!(session.handle_line("quit"), Control::Quit);
    }

    #[test]
    fn deleting_a_good_score_asks_first() {
        let mut session = session(&[0, 1, 2, 3, 0]);
        lose_at_length(&mut session, 4);
        session.handle_line("Ada");

        session.handle_line("delete 1");
        assert!(session.awaiting_answer());
        session.handle_line("no");
        assert_eq!(points(&session), vec![3]);

        session.handle_line("delete 1");
        session.handle_line("y");
        assert!(session.board().list_scores()[0].is_placeholder());
    }

    #[test]
    fn reset_needs_a_yes() {
        let mut session = session(&[0, 1, 2, 3, 0]);
        lose_at_length(&mut session, 4);
        session.handle_line("Ada");

        session.handle_line("reset");
        session.handle_line("maybe");
        assert_eq!(points(&session), vec![3]);

        session.handle_line("reset");
        session.handle_line("yes");
        assert!(session.board().list_scores()[0].is_placeholder());
    }

    #[tokio::test]
    async fn run_stops_when_input_ends() {
        let mut session = session(&[]);
        let input: &[u8] = b"start\nstop\n";
        session.run(input, future::pending()).await.unwrap();

        assert_eq!(session.game().phase(), RoundPhase::Idle);
        assert_eq!(session.game().pending_timers(), 0);
        assert!(output(&session).contains("Stopped."));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let mut session = session(&[]);
        let input = tokio::io::BufReader::new(tokio::io::empty());
        session.run(input, async {}).await.unwrap();
        assert_eq!(session.game().phase(), RoundPhase::Idle);
    }
}
