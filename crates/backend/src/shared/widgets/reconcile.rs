//! Module list reconciliation
//!
//! A drag-and-drop surface only ever shows one filtered view of a tenant's
//! modules. When the user reorders that view, the full list (hidden and
//! out-of-view modules included) is rebuilt as
//!
//! ```text
//! M' = V' ++ disabled ++ excluded-by-category ++ other hidden enabled
//! ```
//!
//! where `V'` is the reordered visible subset and each trailing group keeps
//! its previous relative order. Reordering one view therefore never moves
//! modules that view cannot see relative to each other.

use std::collections::{HashMap, HashSet};

use contracts::shared::widgets::{Module, ModuleView};

use super::catalog::WidgetCatalog;

/// Whether `module` is shown by `view`.
pub fn is_visible(module: &Module, view: &ModuleView, catalog: &WidgetCatalog) -> bool {
    module.enabled && view.includes(catalog.category_of(module))
}

/// Modules shown by `view`, in display order.
pub fn visible_modules<'a>(
    modules: &'a [Module],
    view: &ModuleView,
    catalog: &WidgetCatalog,
) -> Vec<&'a Module> {
    let mut visible: Vec<&Module> = modules
        .iter()
        .filter(|m| is_visible(m, view, catalog))
        .collect();
    visible.sort_by_key(|m| m.order);
    visible
}

/// Precedence of a module that is not part of the reordered subset.
fn hidden_group(module: &Module, view: &ModuleView, catalog: &WidgetCatalog) -> u8 {
    if !module.enabled {
        0
    } else if !view.includes(catalog.category_of(module)) {
        1
    } else {
        2
    }
}

/// Rebuild the full module list from a reordered visible subset.
///
/// `reordered_visible` is the new order of the view's ids. Ids that are
/// unknown, repeated, or not actually visible in `view` are ignored, so the
/// result always holds exactly the ids of `modules`. `order` is renumbered
/// from 1 in the resulting sequence.
///
/// `modules` is expected in stored order; its position breaks ties between
/// equal `order` values.
pub fn reconcile(
    modules: &[Module],
    reordered_visible: &[String],
    view: &ModuleView,
    catalog: &WidgetCatalog,
) -> Vec<Module> {
    let by_id: HashMap<&str, &Module> = modules.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut placed: HashSet<&str> = HashSet::with_capacity(reordered_visible.len());
    let mut result: Vec<Module> = Vec::with_capacity(modules.len());

    for id in reordered_visible {
        let Some(&module) = by_id.get(id.as_str()) else {
            continue;
        };
        if !is_visible(module, view, catalog) || !placed.insert(module.id.as_str()) {
            continue;
        }
        result.push(module.clone());
    }

    let mut rest: Vec<(u8, i64, usize, &Module)> = modules
        .iter()
        .enumerate()
        .filter(|(_, m)| !placed.contains(m.id.as_str()))
        .map(|(idx, m)| (hidden_group(m, view, catalog), m.order, idx, m))
        .collect();
    rest.sort_by_key(|(group, order, idx, _)| (*group, *order, *idx));

    result.extend(rest.into_iter().map(|(_, _, _, m)| m.clone()));

    for (idx, module) in result.iter_mut().enumerate() {
        module.order = idx as i64 + 1;
    }
    result
}

/// Apply a drag from `from_index` to `to_index` of `visible_ids`.
///
/// Returns `None` when the drag is a no-op: equal positions, an index
/// outside `visible_ids`, an id that is not a visible module, or an empty view.
pub fn reorder_visible(
    modules: &[Module],
    view: &ModuleView,
    visible_ids: &[String],
    from_index: usize,
    to_index: usize,
    catalog: &WidgetCatalog,
) -> Option<Vec<Module>> {
    if from_index == to_index || from_index >= visible_ids.len() || to_index >= visible_ids.len() {
        return None;
    }

    let is_visible_id = |id: &str| {
        modules
            .iter()
            .any(|m| m.id == id && is_visible(m, view, catalog))
    };
    if !is_visible_id(visible_ids[from_index].as_str())
        || !is_visible_id(visible_ids[to_index].as_str())
    {
        return None;
    }

    let mut reordered = visible_ids.to_vec();
    move_item(&mut reordered, from_index, to_index);

    Some(reconcile(modules, &reordered, view, catalog))
}

/// Move the element at `from` to `to`, shifting the elements in between.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::shared::widgets::{WidgetCategory, WidgetDescriptor, WidgetSize};

    fn catalog() -> WidgetCatalog {
        let d = |id: &str, category, position| WidgetDescriptor {
            id: id.into(),
            label: id.to_uppercase(),
            category,
            default_enabled: true,
            default_size: WidgetSize::Small,
            default_position: position,
        };
        WidgetCatalog::from_descriptors(vec![
            d("a", WidgetCategory::Dashboard, 1),
            d("b", WidgetCategory::Dashboard, 2),
            d("c", WidgetCategory::Dashboard, 3),
            d("d", WidgetCategory::Standard, 4),
            d("x", WidgetCategory::Advanced, 5),
            d("y", WidgetCategory::Advanced, 6),
        ])
    }

    fn ids(modules: &[Module]) -> Vec<&str> {
        modules.iter().map(|m| m.id.as_str()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn mixed_modules() -> Vec<Module> {
        vec![
            Module::builtin("x", true, 1),
            Module::builtin("a", true, 3),
            Module::builtin("c", false, 4),
            Module::builtin("b", true, 6),
            Module::builtin("y", false, 7),
            Module::builtin("d", true, 9),
        ]
    }

    #[test]
    fn test_documented_scenario() {
        let catalog = catalog();
        let modules = vec![
            Module::builtin("a", true, 1),
            Module::builtin("b", true, 2),
            Module::builtin("c", false, 3),
        ];
        let view = ModuleView::dashboard();
        let visible: Vec<String> = visible_modules(&modules, &view, &catalog)
            .iter()
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(visible, strings(&["a", "b"]));

        let result = reorder_visible(&modules, &view, &visible, 0, 1, &catalog).unwrap();

        assert_eq!(ids(&result), vec!["b", "a", "c"]);
        assert_eq!(result[0].order, 1);
        assert_eq!(result[1].order, 2);
        assert!(!result[2].enabled);
        assert_eq!(result[2].order, 3);
    }

    #[test]
    fn test_hidden_groups_follow_precedence() {
        let catalog = catalog();
        let modules = mixed_modules();
        let view = ModuleView::dashboard();

        // visible: a(3), b(6), d(9); drag d to the front
        let result =
            reorder_visible(&modules, &view, &strings(&["a", "b", "d"]), 2, 0, &catalog).unwrap();

        // disabled (c, y by old order) then advanced (x)
        assert_eq!(ids(&result), vec!["d", "a", "b", "c", "y", "x"]);
        let orders: Vec<i64> = result.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_stale_enabled_modules_trail_after_excluded() {
        let catalog = catalog();
        let modules = mixed_modules();
        let view = ModuleView::dashboard();

        // client only knew about a and b; d is enabled and in view but not listed
        let result = reconcile(&modules, &strings(&["b", "a"]), &view, &catalog);
        assert_eq!(ids(&result), vec!["b", "a", "c", "y", "x", "d"]);
    }

    #[test]
    fn test_no_op_drags() {
        let catalog = catalog();
        let modules = mixed_modules();
        let view = ModuleView::dashboard();
        let visible = strings(&["a", "b", "d"]);

        assert!(reorder_visible(&modules, &view, &visible, 1, 1, &catalog).is_none());
        assert!(reorder_visible(&modules, &view, &visible, 0, 3, &catalog).is_none());
        assert!(reorder_visible(&modules, &view, &visible, 5, 0, &catalog).is_none());
        assert!(reorder_visible(&modules, &view, &[], 0, 1, &catalog).is_none());

        // "c" is disabled, so it is not part of the visible subset
        let with_hidden = strings(&["a", "c", "b"]);
        assert!(reorder_visible(&modules, &view, &with_hidden, 1, 0, &catalog).is_none());
        let with_unknown = strings(&["a", "zzz"]);
        assert!(reorder_visible(&modules, &view, &with_unknown, 0, 1, &catalog).is_none());
    }

    #[test]
    fn test_empty_view_keeps_modules() {
        let catalog = catalog();
        let modules = vec![Module::builtin("a", false, 1), Module::builtin("x", true, 2)];
        let view = ModuleView::dashboard();
        assert!(visible_modules(&modules, &view, &catalog).is_empty());

        let result = reconcile(&modules, &[], &view, &catalog);
        assert_eq!(ids(&result), ids(&modules));
    }

    #[test]
    fn test_reconcile_ignores_duplicate_and_unknown_ids() {
        let catalog = catalog();
        let modules = mixed_modules();
        let view = ModuleView::dashboard();

        let result = reconcile(
            &modules,
            &strings(&["b", "ghost", "b", "a", "c", "d"]),
            &view,
            &catalog,
        );
        assert_eq!(ids(&result), vec!["b", "a", "d", "c", "y", "x"]);
    }

    #[test]
    fn test_ties_are_broken_by_list_position() {
        let catalog = catalog();
        let modules = vec![
            Module::builtin("y", false, 5),
            Module::builtin("c", false, 5),
            Module::builtin("a", true, 1),
        ];
        let result = reconcile(&modules, &strings(&["a"]), &ModuleView::dashboard(), &catalog);
        assert_eq!(ids(&result), vec!["a", "y", "c"]);
    }

    /// Small deterministic generator, enough to walk many drag combinations.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: usize) -> usize {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((self.0 >> 33) as usize) % bound.max(1)
        }
    }

    fn random_modules(rng: &mut Lcg) -> Vec<Module> {
        let mut modules: Vec<Module> = ["a", "b", "c", "d", "x", "y"]
            .iter()
            .map(|id| Module::builtin(*id, rng.next(3) != 0, rng.next(20) as i64))
            .collect();
        modules.sort_by_key(|m| m.order);
        modules
    }

    #[test]
    fn test_properties_over_many_drags() {
        let catalog = catalog();
        let mut rng = Lcg(42);

        for _ in 0..500 {
            let modules = random_modules(&mut rng);
            let view = if rng.next(2) == 0 {
                ModuleView::dashboard()
            } else {
                ModuleView::advanced()
            };
            let visible: Vec<String> = visible_modules(&modules, &view, &catalog)
                .iter()
                .map(|m| m.id.clone())
                .collect();

            // no-op reorder keeps relative order
            let same = reconcile(&modules, &visible, &view, &catalog);
            let mut expected = visible.clone();
            let mut rest: Vec<&Module> =
                modules.iter().filter(|m| !visible.contains(&m.id)).collect();
            rest.sort_by_key(|m| (hidden_group(m, &view, &catalog), m.order));
            expected.extend(rest.iter().map(|m| m.id.clone()));
            assert_eq!(
                same.iter().map(|m| m.id.clone()).collect::<Vec<_>>(),
                expected
            );

            if visible.len() < 2 {
                continue;
            }
            let from = rng.next(visible.len());
            let to = rng.next(visible.len());
            let Some(result) = reorder_visible(&modules, &view, &visible, from, to, &catalog)
            else {
                assert_eq!(from, to);
                continue;
            };

            // set conservation
            let mut before: Vec<&str> = ids(&modules);
            let mut after: Vec<&str> = ids(&result);
            before.sort();
            after.sort();
            assert_eq!(before, after);
            let unique: HashSet<&str> = after.iter().copied().collect();
            assert_eq!(unique.len(), after.len());

            // the dragged subset comes first, in the new order
            let mut moved = visible.clone();
            move_item(&mut moved, from, to);
            assert_eq!(
                result[..moved.len()]
                    .iter()
                    .map(|m| m.id.clone())
                    .collect::<Vec<_>>(),
                moved
            );

            // stability outside the visible subset
            let position = |id: &str| result.iter().position(|m| m.id == id).unwrap();
            for m1 in modules.iter().filter(|m| !visible.contains(&m.id)) {
                for m2 in modules.iter().filter(|m| !visible.contains(&m.id)) {
                    if m1.order < m2.order
                        && hidden_group(m1, &view, &catalog) == hidden_group(m2, &view, &catalog)
                    {
                        assert!(position(&m1.id) < position(&m2.id));
                    }
                }
            }

            // nothing but order changes
            for m in &result {
                let original = modules.iter().find(|o| o.id == m.id).unwrap();
                assert_eq!(m.enabled, original.enabled);
                assert_eq!(m.custom, original.custom);
            }
        }
    }
}
