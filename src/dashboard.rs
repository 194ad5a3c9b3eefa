use std::collections::VecDeque;
use std::path::Path;

use crate::predictor::XgPredictor;
use crate::schema::{
    BINARY_COLUMN, CATEGORICAL_COLUMNS, CATEGORICAL_OPTIONS, NUMERICAL_COLUMNS, ShotInput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Competition,
    Match,
    Player,
    XgPrediction,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::Competition,
        Page::Match,
        Page::Player,
        Page::XgPrediction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Competition => "Competition",
            Page::Match => "Match",
            Page::Player => "Football Player",
            Page::XgPrediction => "XG Prediction",
        }
    }

    fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Page {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    pub fn prev(self) -> Page {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Figure {
    pub heading: &'static str,
    pub asset: &'static str,
    pub caption: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum ContentBlock {
    Heading(&'static str),
    Figure(Figure),
    Text(&'static str),
}

#[derive(Debug, Clone)]
pub struct PageContent {
    pub title: &'static str,
    pub subtitle: Option<&'static str>,
    pub blocks: Vec<ContentBlock>,
}

const XG_OVER_TIME_TEXT: &str = "This line plot highlights the moments when the team had significant scoring \
opportunities (high xG values) and when their offensive pressure increased or decreased. The xG is tracked \
at each minute, showing how attacking efforts were spread across the match.";

/// Static content for the non-interactive pages.
pub fn page_content(page: Page) -> PageContent {
    match page {
        Page::Home => PageContent {
            title: "Welcome to the Football Dashboard",
            subtitle: None,
            blocks: vec![
                ContentBlock::Text(
                    "Insights into football data with detailed visualizations and analysis.",
                ),
                ContentBlock::Heading("Features"),
                ContentBlock::Text("Competitions: team performances and statistics from major tournaments."),
                ContentBlock::Text("Matches: match data including goals, shots and xG analysis."),
                ContentBlock::Text("Players: individual player statistics and contributions."),
                ContentBlock::Text("Expected Goals (XG) Prediction: predict the likelihood of scoring from shot context."),
                ContentBlock::Text("Navigate with Tab or the number keys to explore the sections."),
            ],
        },
        Page::Competition => PageContent {
            title: "Competition Analysis",
            subtitle: Some("Visualizations for the 2019 FIFA Women's World Cup"),
            blocks: vec![
                ContentBlock::Text(
                    "Key statistics from the 2019 FIFA Women's World Cup: wins, draws, losses and goal differences.",
                ),
                ContentBlock::Figure(Figure {
                    heading: "Number of Wins, Draws, Losses per Team",
                    asset: "competition1.jpg",
                    caption: "Number of Wins, Draws, Losses per Team",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Goal Differences per Team",
                    asset: "competition2.jpg",
                    caption: "Goal Differences per Team",
                }),
            ],
        },
        Page::Match => PageContent {
            title: "Match Analysis",
            subtitle: Some("Women's World Cup 2019 Final | Match ID: 69321"),
            blocks: vec![
                ContentBlock::Heading("Team 1: The United States Women's"),
                ContentBlock::Figure(Figure {
                    heading: "Team",
                    asset: "usa.jpg",
                    caption: "The United States Women's Team",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Shot Map with xG and Shot Technique",
                    asset: "shotmap1.jpg",
                    caption: "Shot Map with Expected Goals (xG) and Shot Technique",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Shot Body Part Distribution",
                    asset: "bodypart1.jpg",
                    caption: "Distribution of Shots by Body Part",
                }),
                ContentBlock::Figure(Figure {
                    heading: "xG Over Time",
                    asset: "xg1.jpg",
                    caption: "Expected Goals (xG) Over Time",
                }),
                ContentBlock::Text(XG_OVER_TIME_TEXT),
                ContentBlock::Heading("Team 2: The Netherlands Women's"),
                ContentBlock::Figure(Figure {
                    heading: "Team",
                    asset: "netherlands.jpg",
                    caption: "The Netherlands Women's",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Shot Map with xG and Shot Technique",
                    asset: "shotmap2.jpg",
                    caption: "Shot Map with Expected Goals (xG) and Shot Technique",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Shot Body Part Distribution",
                    asset: "bodypart2.jpg",
                    caption: "Distribution of Shots by Body Part",
                }),
                ContentBlock::Figure(Figure {
                    heading: "xG Over Time",
                    asset: "xg2.jpg",
                    caption: "Expected Goals (xG) Over Time",
                }),
                ContentBlock::Text(XG_OVER_TIME_TEXT),
                ContentBlock::Figure(Figure {
                    heading: "Comparison of xG by Time",
                    asset: "compare.jpg",
                    caption: "Comparison of Expected Goals (xG) Over Time",
                }),
                ContentBlock::Text(
                    "The United States consistently outperform the opponent, with a higher xG throughout the \
                     match, indicating more and better quality scoring chances.",
                ),
                ContentBlock::Text(
                    "xG measures the probability of a shot turning into a goal from shot type, position and \
                     game context, giving a more objective view of whether the result matched the chances created.",
                ),
            ],
        },
        Page::Player => PageContent {
            title: "Football Player Analysis",
            subtitle: None,
            blocks: vec![
                ContentBlock::Heading("My Favourite Player: Alex Morgan"),
                ContentBlock::Figure(Figure {
                    heading: "Player",
                    asset: "alexmorgan.jpg",
                    caption: "Alex Morgan",
                }),
                ContentBlock::Figure(Figure {
                    heading: "Distribution of Shot xG Values",
                    asset: "xgalex.jpg",
                    caption: "Histogram with KDE of Shot xG Values",
                }),
                ContentBlock::Text("Range and frequency of the xG values of Alex Morgan's shots."),
                ContentBlock::Figure(Figure {
                    heading: "Pass Completion Percentage",
                    asset: "alexpasses.jpg",
                    caption: "Pass Completion Percentage Visualization",
                }),
                ContentBlock::Heading("Analysis for Megan Anna Rapinoe"),
                ContentBlock::Figure(Figure {
                    heading: "Pass Network on the Pitch",
                    asset: "meganpitch.jpg",
                    caption: "Pass Network Visualization on the Pitch",
                }),
                ContentBlock::Text("Connections with teammates and the areas of the pitch where she was most involved."),
                ContentBlock::Figure(Figure {
                    heading: "Pass Completion Percentage (Megan Anna Rapinoe)",
                    asset: "meganpasses.jpg",
                    caption: "Pass Completion Percentage Visualization",
                }),
            ],
        },
        Page::XgPrediction => PageContent {
            title: "Expected Goals (XG) Prediction",
            subtitle: None,
            blocks: Vec::new(),
        },
    }
}

/// Figures whose asset file does not exist under `asset_dir`.
pub fn missing_assets(asset_dir: &Path) -> Vec<&'static str> {
    let mut out = Vec::new();
    for page in Page::ALL {
        for block in page_content(page).blocks {
            if let ContentBlock::Figure(fig) = block
                && !asset_dir.join(fig.asset).exists()
            {
                out.push(fig.asset);
            }
        }
    }
    out
}

const NUMERIC_LABELS: [&str; 5] = [
    "Location X (e.g., 88.7)",
    "Location Y (e.g., 55.6)",
    "End Location X (e.g., 100.2)",
    "End Location Y (e.g., 50.8)",
    "End Location Z (e.g., 0)",
];

const CHOICE_LABELS: [&str; 6] = [
    "Play Pattern",
    "Position",
    "Shot Body Part",
    "Shot Outcome",
    "Shot Technique",
    "Shot Type",
];

pub const FORM_FIELDS: usize = NUMERICAL_COLUMNS.len() + CATEGORICAL_OPTIONS.len() + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XgForm {
    pub numeric: [String; 5],
    pub choices: [usize; 6],
    pub under_pressure: bool,
    pub focus: usize,
}

impl Default for XgForm {
    fn default() -> Self {
        Self {
            numeric: Default::default(),
            choices: [0; 6],
            under_pressure: true,
            focus: 0,
        }
    }
}

impl XgForm {
    pub fn label(&self, field: usize) -> &'static str {
        match field {
            f if f < 5 => NUMERIC_LABELS[f],
            f if f < 11 => CHOICE_LABELS[f - 5],
            _ => "Under Pressure?",
        }
    }

    pub fn value(&self, field: usize) -> String {
        match field {
            f if f < 5 => self.numeric[f].clone(),
            f if f < 11 => CATEGORICAL_OPTIONS[f - 5][self.choices[f - 5]].to_string(),
            _ => {
                let label = if self.under_pressure { "Yes" } else { "No" };
                label.to_string()
            }
        }
    }

    pub fn is_text_field(&self, field: usize) -> bool {
        field < NUMERICAL_COLUMNS.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FORM_FIELDS;
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FORM_FIELDS - 1) % FORM_FIELDS;
    }

    /// Cycles the focused option field; no-op on text fields.
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            f if f < 5 => {}
            f if f < 11 => {
                let n = CATEGORICAL_OPTIONS[f - 5].len();
                let cur = self.choices[f - 5];
                self.choices[f - 5] = if forward { (cur + 1) % n } else { (cur + n - 1) % n };
            }
            _ => self.under_pressure = !self.under_pressure,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.is_text_field(self.focus) && !c.is_control() {
            self.numeric[self.focus].push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_text_field(self.focus) {
            self.numeric[self.focus].pop();
        }
    }

    pub fn to_input(&self) -> ShotInput {
        let choice = |i: usize| CATEGORICAL_OPTIONS[i][self.choices[i]].to_string();
        ShotInput {
            location_x: self.numeric[0].clone(),
            location_y: self.numeric[1].clone(),
            end_loc_x: self.numeric[2].clone(),
            end_loc_y: self.numeric[3].clone(),
            end_loc_z: self.numeric[4].clone(),
            play_pattern: choice(0),
            position: choice(1),
            shot_body_part: choice(2),
            shot_outcome: choice(3),
            shot_technique: choice(4),
            shot_type: choice(5),
            under_pressure: u8::from(self.under_pressure),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    Value(f64),
    Error(String),
}

/// `(column, value)` rows for echoing a submitted record, in schema order.
pub fn input_rows(input: &ShotInput) -> Vec<(&'static str, String)> {
    let mut rows: Vec<(&'static str, String)> = input
        .numerical_fields()
        .into_iter()
        .map(|(name, value)| (name, value.trim().to_string()))
        .collect();
    rows.extend(
        CATEGORICAL_COLUMNS
            .into_iter()
            .zip(input.categorical_fields())
            .map(|(name, value)| (name, value.to_string())),
    );
    rows.push((BINARY_COLUMN, input.under_pressure.to_string()));
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    Tab,
    BackTab,
    Esc,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub page: Page,
    pub form: XgForm,
    pub outcome: Option<PredictionOutcome>,
    // Last input that passed validation, echoed next to the outcome.
    pub submitted: Option<ShotInput>,
    // Set when artifacts failed to load at startup; disables submission.
    pub model_error: Option<String>,
    pub logs: VecDeque<String>,
    pub scroll: u16,
    pub should_quit: bool,
}

impl DashboardState {
    pub fn new(model_error: Option<String>) -> Self {
        Self {
            page: Page::Home,
            form: XgForm::default(),
            outcome: None,
            submitted: None,
            model_error,
            logs: VecDeque::new(),
            scroll: 0,
            should_quit: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn navigate(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.scroll = 0;
        }
    }

    fn editing_text(&self) -> bool {
        self.page == Page::XgPrediction && self.form.is_text_field(self.form.focus)
    }

    pub fn on_key(&mut self, key: Key, predictor: Option<&XgPredictor>) {
        match key {
            Key::Esc => self.should_quit = true,
            Key::Tab => self.navigate(self.page.next()),
            Key::BackTab => self.navigate(self.page.prev()),
            Key::Char(c) if !self.editing_text() && ('1'..='5').contains(&c) => {
                let idx = c as usize - '1' as usize;
                self.navigate(Page::ALL[idx]);
            }
            Key::Char('q') if !self.editing_text() => self.should_quit = true,
            _ if self.page == Page::XgPrediction => self.on_form_key(key, predictor),
            Key::Down | Key::Char('j') => self.scroll = self.scroll.saturating_add(1),
            Key::Up | Key::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: Key, predictor: Option<&XgPredictor>) {
        match key {
            Key::Down => self.form.focus_next(),
            Key::Up => self.form.focus_prev(),
            Key::Right => self.form.cycle(true),
            Key::Left => self.form.cycle(false),
            Key::Backspace => self.form.backspace(),
            Key::Char(c) => self.form.push_char(c),
            Key::Enter => self.submit(predictor),
            _ => {}
        }
    }

    pub fn submit(&mut self, predictor: Option<&XgPredictor>) {
        let Some(predictor) = predictor else {
            let reason = self
                .model_error
                .clone()
                .unwrap_or_else(|| "model not loaded".to_string());
            self.outcome = Some(PredictionOutcome::Error(reason));
            self.push_log("[WARN] Prediction unavailable: model not loaded");
            return;
        };
        let input = self.form.to_input();
        match predictor.predict_one(&input) {
            Ok(value) => {
                self.push_log(format!("[INFO] Predicted XG {value:.4}"));
                self.outcome = Some(PredictionOutcome::Value(value));
                self.submitted = Some(input);
            }
            Err(err) => {
                self.push_log(format!("[WARN] {err}"));
                self.outcome = Some(PredictionOutcome::Error(err.to_string()));
                // Field errors mean the record never reached the model.
                self.submitted = err.field().is_none().then_some(input);
            }
        }
    }
}
