use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EnrollmentCreatedEvent, EventHandler, EventProducer, Handler, OrderPaidEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub enrollment_created_producer: Vec<EventProducer<EnrollmentCreatedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for emitter in &self.order_paid_producer {
            trace!("📬️ Notifying order paid hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_enrollment_created(&self, event: EnrollmentCreatedEvent) {
        for emitter in &self.enrollment_created_producer {
            trace!("📬️ Notifying enrollment created hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_enrollment_created: Option<EventHandler<EnrollmentCreatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_enrollment_created = hooks.on_enrollment_created.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_enrollment_created }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_enrollment_created {
            result.enrollment_created_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook. Each task lives until all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_enrollment_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_enrollment_created: Option<Handler<EnrollmentCreatedEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    pub fn on_enrollment_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(EnrollmentCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_enrollment_created = Some(Arc::new(f));
        self
    }
}
