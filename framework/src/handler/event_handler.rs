use std::hash::{Hash, Hasher};

use twilight_gateway::EventType;
use uuid::Uuid;

use crate::{context::EventContext, BoxFuture, Error};

pub type EventFunc<T> = fn(EventContext<T>) -> BoxFuture<'static, Result<(), Error>>;

#[derive(Clone)]
pub struct EventHandler<T: Clone + Send + Sync> {
    pub module: String,
    pub uuid: Uuid,
    pub event: EventType,
    pub func: EventFunc<T>,
}

impl<T: Clone + Send + Sync> EventHandler<T> {
    pub fn new(module: &str, event: EventType, func: EventFunc<T>) -> Self {
        Self {
            module: module.to_string(),
            uuid: Uuid::now_v7(),
            event,
            func,
        }
    }

    pub async fn run(&self, ctx: EventContext<T>) -> Result<(), Error> {
        (self.func)(ctx).await
    }
}

impl<T: Clone + Send + Sync> Hash for EventHandler<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
        self.event.hash(state);
    }
}

impl<T: Clone + Send + Sync> PartialEq for EventHandler<T> {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event && self.uuid == other.uuid
    }
}

impl<T: Clone + Send + Sync> Eq for EventHandler<T> {}
