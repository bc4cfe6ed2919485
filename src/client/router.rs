use std::fmt;
use std::str::FromStr;

use crate::contract::CandidateId;

/// Views of the voting frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Election,
    UkmDetail,
    VoteConfirmation,
    Results,
    Result,
    Profile,
    Help,
    SignIn,
    SignUp,
}

const PAGES: [(Page, &str); 10] = [
    (Page::Home, "home"),
    (Page::Election, "election"),
    (Page::UkmDetail, "ukmdetail"),
    (Page::VoteConfirmation, "voteconfirmation"),
    (Page::Results, "results"),
    (Page::Result, "result"),
    (Page::Profile, "profile"),
    (Page::Help, "help"),
    (Page::SignIn, "signin"),
    (Page::SignUp, "signup"),
];

impl Page {
    pub fn as_str(&self) -> &'static str {
        PAGES
            .iter()
            .find(|(page, _)| page == self)
            .map(|(_, name)| *name)
            .unwrap_or("home")
    }

    /// `#results`, `results` or `#/results`; unknown values fall back to home.
    pub fn from_hash(hash: &str) -> Self {
        hash.trim_start_matches('#')
            .trim_start_matches('/')
            .parse()
            .unwrap_or_default()
    }

    pub fn hash(&self) -> String {
        format!("#{}", self.as_str())
    }

    pub fn requires_login(&self) -> bool {
        matches!(self, Page::Profile | Page::VoteConfirmation)
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        // "elections" appears in nav links
        let wanted = if wanted == "elections" { "election".to_string() } else { wanted };
        PAGES
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(page, _)| *page)
            .ok_or_else(|| format!("unknown page: {}", s))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral navigation state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Navigator {
    pub current: Page,
    pub selected_ukm: Option<String>,
    pub selected_candidate: Option<CandidateId>,
    /// Shown once on the election page after a vote is sent
    pub show_vote_success: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigates, redirecting to sign-in when the page needs a session.
    pub fn navigate(&mut self, page: Page, logged_in: bool) -> Page {
        self.current = if page.requires_login() && !logged_in {
            Page::SignIn
        } else {
            page
        };
        self.show_vote_success = false;
        self.current
    }

    pub fn open_ukm(&mut self, name: &str) {
        self.selected_ukm = Some(name.to_string());
        self.selected_candidate = None;
        self.current = Page::UkmDetail;
        self.show_vote_success = false;
    }

    pub fn select_candidate(&mut self, candidate: CandidateId, logged_in: bool) -> Page {
        self.selected_candidate = Some(candidate);
        self.navigate(Page::VoteConfirmation, logged_in)
    }

    /// Back to the candidate list with the UKM kept.
    pub fn change_vote(&mut self) {
        self.selected_candidate = None;
        self.current = Page::UkmDetail;
    }

    pub fn vote_submitted(&mut self) {
        self.selected_candidate = None;
        self.current = Page::Election;
        self.show_vote_success = true;
    }
}
