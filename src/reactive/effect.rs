//! Effects and their ownership tree.
//!
//! An effect re-runs whenever a signal it read changes. Effects created while
//! another effect runs belong to it: the owner's next run (or its disposal)
//! first runs their [`on_cleanup`] callbacks and removes them. A slot's render
//! pipeline is built from exactly this shape:
//!
//! ```ignore
//! create_effect(move || {
//!     let template = template_var.get();
//!     on_cleanup(move || clear_rendered());
//!     create_effect(move || render(template, data.get()));
//! });
//! ```
//!
//! Use [`untrack`] to create an effect that outlives the running one.

pub use super::signal::{
    create_effect, create_effect_with_id, dispose_effect, is_effect_active, on_cleanup, untrack,
    EffectId,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal::{create_signal, reset_runtime, runtime_size};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn setup() {
        reset_runtime();
    }

    #[test]
    fn template_swap_tears_down_the_previous_pass() {
        setup();
        let (template, set_template) = create_signal("A");
        let (data, set_data) = create_signal(0_i32);
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let log_c = log.clone();
        create_effect(move || {
            let name = template.get();
            let log_cc = log_c.clone();
            on_cleanup(move || log_cc.borrow_mut().push(format!("clear {name}")));
            let log_cc = log_c.clone();
            create_effect(move || log_cc.borrow_mut().push(format!("{name}:{}", data.get())));
        });
        set_data.set(1);
        set_template.set("B");
        set_data.set(2);
        assert_eq!(*log.borrow(), vec!["A:0", "A:1", "clear A", "B:1", "B:2"]);
    }

    #[test]
    fn dispose_is_idempotent() {
        setup();
        let eid = create_effect_with_id(|| {});
        dispose_effect(eid);
        dispose_effect(eid);
        assert!(!is_effect_active(eid));
    }

    #[test]
    fn disposing_an_owner_removes_the_whole_tree() {
        setup();
        let (r, w) = create_signal(0_i32);
        let inner_runs = Rc::new(Cell::new(0_u32));
        let inner_c = inner_runs.clone();
        let outer = create_effect_with_id(move || {
            let inner_cc = inner_c.clone();
            create_effect(move || {
                let _ = r.get();
                inner_cc.set(inner_cc.get() + 1);
                create_effect(move || {
                    let _ = r.get();
                });
            });
        });
        assert_eq!(runtime_size(), (1, 3));
        dispose_effect(outer);
        assert_eq!(runtime_size(), (1, 0));
        w.set(1);
        assert_eq!(inner_runs.get(), 1);
    }

    #[test]
    fn untracked_effect_creation_is_not_owned() {
        setup();
        let (trigger, set_trigger) = create_signal(0_i32);
        let (r, w) = create_signal(0_i32);
        let inner_runs = Rc::new(Cell::new(0_u32));
        let inner_c = inner_runs.clone();
        let created = Rc::new(Cell::new(false));
        let created_c = created.clone();
        create_effect(move || {
            let _ = trigger.get();
            if !created_c.get() {
                created_c.set(true);
                let inner_cc = inner_c.clone();
                untrack(|| {
                    create_effect(move || {
                        let _ = r.get();
                        inner_cc.set(inner_cc.get() + 1);
                    })
                });
            }
        });
        set_trigger.set(1);
        w.set(1);
        assert_eq!(inner_runs.get(), 2);
    }

    #[test]
    fn effect_disposing_itself_mid_run() {
        setup();
        let (r, w) = create_signal(0_i32);
        let id = Rc::new(Cell::new(None));
        let id_c = id.clone();
        let runs = Rc::new(Cell::new(0_u32));
        let runs_c = runs.clone();
        let eid = create_effect_with_id(move || {
            runs_c.set(runs_c.get() + 1);
            if r.get() > 0 {
                if let Some(eid) = id_c.get() {
                    dispose_effect(eid);
                }
            }
        });
        id.set(Some(eid));
        w.set(1);
        w.set(2);
        assert_eq!(runs.get(), 2);
        assert!(!is_effect_active(eid));
        assert_eq!(runtime_size().1, 0);
    }
}
