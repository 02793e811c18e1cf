use log::{debug, trace};
use serde::Serialize;
use serde_with::{serde_as, Map};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    // signup order
    pub participants: Vec<String>,
}

/// Snapshot of the catalog, serialised as an object keyed by activity name.
#[serde_as]
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct Activities(#[serde_as(as = "Map<_, _>")] pub Vec<(String, Activity)>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterError {
    NoSuchActivity,
    AlreadyRegistered,
    NotInRoster,
    Full,
}

pub struct Catalog {
    activities: RwLock<Vec<(String, Activity)>>,
    enforce_capacity: bool,
}

impl Catalog {
    pub fn new(activities: Vec<(String, Activity)>, enforce_capacity: bool) -> Self {
        Self {
            activities: RwLock::new(activities),
            enforce_capacity,
        }
    }

    pub fn seeded(enforce_capacity: bool) -> Self {
        Self::new(seed(), enforce_capacity)
    }

    pub async fn list(&self) -> Activities {
        Activities(self.activities.read().await.clone())
    }

    pub async fn signup(&self, name: &str, email: &str) -> Result<(), RosterError> {
        let mut activities = self.activities.write().await;
        let activity = find_mut(&mut activities, name)?;

        if activity.participants.iter().any(|p| p == email) {
            return Err(RosterError::AlreadyRegistered);
        }

        let count = activity.participants.len();
        if count >= activity.max_participants as usize {
            if self.enforce_capacity {
                return Err(RosterError::Full);
            }
            debug!("{name}: over capacity ({count}/{})", activity.max_participants);
        }

        activity.participants.push(email.into());
        trace!("{name}: {} participants", activity.participants.len());

        Ok(())
    }

    pub async fn unregister(&self, name: &str, email: &str) -> Result<(), RosterError> {
        let mut activities = self.activities.write().await;
        let activity = find_mut(&mut activities, name)?;

        let i = activity
            .participants
            .iter()
            .position(|p| p == email)
            .ok_or(RosterError::NotInRoster)?;

        activity.participants.remove(i);
        trace!("{name}: {} participants", activity.participants.len());

        Ok(())
    }
}

fn find_mut<'a>(
    activities: &'a mut [(String, Activity)],
    name: &str,
) -> Result<&'a mut Activity, RosterError> {
    activities
        .iter_mut()
        .find(|(n, _)| n == name)
        .map(|(_, activity)| activity)
        .ok_or(RosterError::NoSuchActivity)
}

fn seed() -> Vec<(String, Activity)> {
    let activity = |name: &str, description: &str, schedule: &str, max: u32, participants: &[&str]| {
        (
            name.to_string(),
            Activity {
                description: description.into(),
                schedule: schedule.into(),
                max_participants: max,
                participants: participants.iter().map(|&p| p.into()).collect(),
            },
        )
    };

    vec![
        activity(
            "Chess Club",
            "Learn strategies and compete in chess tournaments",
            "Fridays, 3:30 PM - 5:00 PM",
            12,
            &["michael@mergington.edu", "daniel@mergington.edu"],
        ),
        activity(
            "Programming Class",
            "Learn programming fundamentals and build software projects",
            "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
            20,
            &["emma@mergington.edu", "sophia@mergington.edu"],
        ),
        activity(
            "Gym Class",
            "Physical education and sports activities",
            "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
            30,
            &["john@mergington.edu", "olivia@mergington.edu"],
        ),
        activity(
            "Soccer Team",
            "Join the school soccer team and compete in matches",
            "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
            22,
            &["liam@mergington.edu", "noah@mergington.edu"],
        ),
        activity(
            "Basketball Team",
            "Practice and play basketball with the school team",
            "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
            15,
            &["ava@mergington.edu", "mia@mergington.edu"],
        ),
        activity(
            "Art Club",
            "Explore your creativity through painting and drawing",
            "Thursdays, 3:30 PM - 5:00 PM",
            15,
            &["amelia@mergington.edu", "harper@mergington.edu"],
        ),
        activity(
            "Drama Club",
            "Act, direct, and produce plays and performances",
            "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
            20,
            &["ella@mergington.edu", "scarlett@mergington.edu"],
        ),
        activity(
            "Math Club",
            "Solve challenging problems and participate in math competitions",
            "Tuesdays, 3:30 PM - 4:30 PM",
            10,
            &["james@mergington.edu", "benjamin@mergington.edu"],
        ),
        activity(
            "Debate Team",
            "Develop public speaking and argumentation skills",
            "Fridays, 4:00 PM - 5:30 PM",
            12,
            &["charlotte@mergington.edu", "henry@mergington.edu"],
        ),
        activity(
            "GitHub Skills",
            "Learn practical coding and collaboration skills through GitHub. \
             Part of our GitHub Certifications program to help with college applications.",
            "Mondays, 3:30 PM - 5:00 PM",
            25,
            &[],
        ),
    ]
}
