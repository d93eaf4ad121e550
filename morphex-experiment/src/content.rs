//! Participant-facing text. Pure data; nothing here affects the flow.

use morphex_core::{ConditionGroup, QUESTIONNAIRE_SIZE};

/// Pre-questionnaire items, "Right now I feel ...". Answered 1-7.
pub const PRE_QUESTIONS: [&str; QUESTIONNAIRE_SIZE] = [
    "comforted",
    "supported",
    "looked after",
    "cared for",
    "secure",
    "safe",
    "protected",
    "unthreatened",
    "better about myself",
    "valued",
    "more positive about myself",
    "I really like myself",
    "loved",
    "cherished",
    "treasured",
    "adored",
];

pub const DEMO_ADVISORY: &str = "Demo Mode Active: the image server could not be reached, \
so practice images are shown instead. Your answers are kept locally.";

const RELATIONSHIP_PROMPT: &str = "Think of a person who is always there for you when you \
are in need. Imagine what they look like and what it is like to be in their company. Think \
about how you do not worry about being abandoned by this person, or that they would try to \
get closer to you than you are comfortable with. Please write about this person, your shared \
time together, and how this person makes you feel safe, comforted, and loved.";

const GROCERY_PROMPT: &str = "Think of a recent time you went grocery shopping alone, with \
no friends or acquaintances. Imagine the details of this trip: the route from your home to \
the store, the appearance of the store, how easily you found what you were looking for and \
the groceries you purchased. Please write down as much as you can about this trip. The task \
is timed with a 10-minute countdown.";

const RELATIONSHIP_PLACEHOLDER: &str = "There may be a particular time or example of these \
good things in the relationship that you could recall here.";

const GROCERY_PLACEHOLDER: &str = "Please write down as much as you can about this grocery \
store trip.";

pub fn writing_prompt(condition: ConditionGroup) -> &'static str {
    match condition {
        ConditionGroup::Relationship => RELATIONSHIP_PROMPT,
        ConditionGroup::Grocery => GROCERY_PROMPT,
    }
}

pub fn writing_placeholder(condition: ConditionGroup) -> &'static str {
    match condition {
        ConditionGroup::Relationship => RELATIONSHIP_PLACEHOLDER,
        ConditionGroup::Grocery => GROCERY_PLACEHOLDER,
    }
}
