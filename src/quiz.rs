//! Description quiz: guess the species from its dex entry.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use futures_util::future::try_join_all;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::api::{Species, SpeciesSource};
use crate::config::Config;
use crate::error::{Error, Result};

/// Highest species id the quiz draws from (generations 1 to 8)
pub const QUIZ_MAX_SPECIES_ID: u32 = 898;
pub const CHOICES_PER_QUESTION: usize = 4;
pub const POINTS_PER_ANSWER: u32 = 10;
pub const DEFAULT_ROUNDS: u32 = 10;
pub const MISSING_FLAVOR_TEXT: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub species_id: u32,
    pub display_name: String,
    pub sprite: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub flavor_text: String,
    pub answer: Choice,
    /// Shuffled; contains `answer` exactly once
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn answer_index(&self) -> usize {
        self.choices
            .iter()
            .position(|c| c == &self.answer)
            .unwrap_or(0)
    }
}

/// `count` distinct ids in `1..=max`
pub fn pick_ids<R: Rng + ?Sized>(rng: &mut R, count: usize, max: u32) -> Vec<u32> {
    let count = count.min(max as usize);
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let id = rng.gen_range(1..=max);
        if seen.insert(id) {
            ids.push(id);
        }
    }
    ids
}

/// Most recent dex entry in `lang`, whitespace collapsed
pub fn flavor_text(species: &Species, lang: &str) -> Option<String> {
    species
        .flavor_text_entries
        .iter()
        .rev()
        .find(|entry| entry.language.name == lang)
        .map(|entry| entry.flavor_text.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn sprite_url(base: &str, id: u32) -> String {
    format!("{}/{id}.png", base.trim_end_matches('/'))
}

pub struct QuestionGenerator<'a, S: SpeciesSource + ?Sized> {
    source: &'a S,
    lang: &'a str,
    sprite_base: &'a str,
    attempts: u32,
    max_id: u32,
}

impl<'a, S: SpeciesSource + ?Sized> QuestionGenerator<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self {
            source,
            lang: &config.lang,
            sprite_base: &config.sprite_base,
            attempts: config.random_attempts.max(1),
            max_id: QUIZ_MAX_SPECIES_ID,
        }
    }

    pub fn with_max_id(mut self, max_id: u32) -> Self {
        self.max_id = max_id;
        self
    }

    /// A fresh question, retrying failed fetches up to the configured attempts
    pub async fn next_question(&self) -> Result<Question> {
        for attempt in 1..=self.attempts {
            match self.try_question().await {
                Ok(question) => return Ok(question),
                Err(error) => warn!(attempt, %error, "could not build quiz question"),
            }
        }
        Err(Error::Lookup {
            attempts: self.attempts,
        })
    }

    async fn try_question(&self) -> Result<Question> {
        let ids = pick_ids(&mut rand::thread_rng(), CHOICES_PER_QUESTION, self.max_id);
        debug!(?ids, "drawing quiz question");

        let keys: Vec<String> = ids.iter().map(u32::to_string).collect();
        let species = try_join_all(keys.iter().map(|key| self.source.species(key))).await?;
        let flavor = species
            .first()
            .and_then(|s| flavor_text(s, self.lang))
            .unwrap_or_else(|| MISSING_FLAVOR_TEXT.to_string());

        let mut choices: Vec<Choice> = species.iter().map(|s| self.choice(s)).collect();
        let answer = choices
            .first()
            .cloned()
            .ok_or(Error::Lookup { attempts: 1 })?;
        choices.shuffle(&mut rand::thread_rng());

        Ok(Question {
            flavor_text: flavor,
            answer,
            choices,
        })
    }

    fn choice(&self, species: &Species) -> Choice {
        Choice {
            species_id: species.id,
            display_name: species
                .localized_name(self.lang)
                .unwrap_or(&species.name)
                .to_string(),
            sprite: sprite_url(self.sprite_base, species.id),
        }
    }
}

/// Score keeping across rounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    rounds: u32,
    played: u32,
    score: u32,
}

impl Quiz {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds,
            played: 0,
            score: 0,
        }
    }

    /// Record a guess; returns whether it was right
    pub fn answer(&mut self, question: &Question, picked: usize) -> bool {
        let correct = question
            .choices
            .get(picked)
            .is_some_and(|c| c == &question.answer);
        if correct {
            self.score += POINTS_PER_ANSWER;
        }
        self.played += 1;
        correct
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn played(&self) -> u32 {
        self.played
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn is_finished(&self) -> bool {
        self.played >= self.rounds
    }
}

impl Default for Quiz {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

/// Play a full game on a line-based terminal. Stops early at end of input.
pub async fn play<S, R, W>(
    generator: &QuestionGenerator<'_, S>,
    mut quiz: Quiz,
    mut input: R,
    mut output: W,
) -> Result<Quiz>
where
    S: SpeciesSource + ?Sized,
    R: BufRead,
    W: Write,
{
    while !quiz.is_finished() {
        let question = generator.next_question().await?;
        writeln!(
            output,
            "\nQuestion {}/{} (score {})",
            quiz.played() + 1,
            quiz.rounds(),
            quiz.score()
        )?;
        writeln!(output, "\"{}\"", question.flavor_text)?;
        for (i, choice) in question.choices.iter().enumerate() {
            writeln!(output, "  {}. {}", i + 1, choice.display_name)?;
        }

        let Some(picked) = read_choice(&mut input, &mut output, question.choices.len())? else {
            break;
        };
        if quiz.answer(&question, picked) {
            writeln!(output, "Correct! It's {}.", question.answer.display_name)?;
        } else {
            writeln!(output, "Wrong. It was {}.", question.answer.display_name)?;
        }
        writeln!(output, "{}", question.answer.sprite)?;
    }

    writeln!(output, "\nFinal score: {}", quiz.score())?;
    Ok(quiz)
}

/// Zero-based pick, or None at end of input
fn read_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    count: usize,
) -> Result<Option<usize>> {
    loop {
        write!(output, "Your answer (1-{count}): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(Some(n - 1)),
            _ => writeln!(output, "Please enter a number between 1 and {count}.")?,
        }
    }
}
