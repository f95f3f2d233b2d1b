#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{
        insertion_index, stack_tree, DragGeometryResolver, DragKind, ListLayout, ResolverConfig,
        RowLayout, RowMetrics, RowShape, TreeLayout,
    };
    use prompt_core::{
        Component, ComponentKind, DropIntent, DropPosition, Folder, ListTarget, Node, Rect, Vec2,
    };

    /// Components (1)
    /// ├── FolderA (2)
    /// │   └── CompX (3)
    /// └── CompZ (6)
    ///
    /// With default metrics (row 24px, 15px per level, width 280):
    ///   root header   y 0..24
    ///   FolderA head  y 24..48, x 15
    ///   CompX         y 48..72, x 30
    ///   CompZ         y 72..96, x 15
    fn sample_root() -> Folder {
        Folder::root().with_children(vec![
            Node::Folder(Folder::new(2, "FolderA").with_children(vec![Node::Component(
                Component::new(3, "CompX", ComponentKind::Main, ""),
            )])),
            Node::Component(Component::new(6, "CompZ", ComponentKind::Context, "")),
        ])
    }

    fn expanded_layout() -> TreeLayout {
        stack_tree(&sample_root(), &HashSet::new(), &RowMetrics::default())
    }

    fn node_intent(target: u64, position: DropPosition) -> DropIntent {
        DropIntent::Node { target, position }
    }

    // ── Reference layout ──────────────────────

    #[test]
    fn stack_tree_nests_rows_and_lists() {
        let layout = expanded_layout();
        assert_eq!(layout.rows.len(), 4);
        assert_eq!(layout.lists.len(), 2);

        let folder_a = layout.rows.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(folder_a.rect, Rect::new(15.0, 24.0, 265.0, 48.0));
        assert_eq!(folder_a.depth, 1);

        let comp_x = layout.rows.iter().find(|r| r.id == 3).unwrap();
        assert_eq!(comp_x.rect, Rect::new(30.0, 48.0, 250.0, 24.0));

        let root_list = layout.lists.iter().find(|l| l.parent == 1).unwrap();
        assert_eq!(root_list.items.len(), 2);
        assert_eq!(root_list.rect, Rect::new(0.0, 24.0, 280.0, 72.0));
    }

    #[test]
    fn stack_tree_hides_collapsed_children() {
        let collapsed: HashSet<u64> = [2].into_iter().collect();
        let layout = stack_tree(&sample_root(), &collapsed, &RowMetrics::default());
        assert!(layout.rows.iter().all(|r| r.id != 3));
        assert!(layout.lists.iter().all(|l| l.parent != 2));
        let folder_a = layout.rows.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(
            folder_a.shape,
            RowShape::Folder {
                header: Rect::new(15.0, 24.0, 265.0, 24.0),
                children: None
            }
        );
    }

    /// Components (1) > A (2) > B (4) > C (5) > Leaf (7), all expanded.
    fn deep_root() -> Folder {
        let leaf = Node::Component(Component::new(7, "Leaf", ComponentKind::Main, ""));
        let c = Folder::new(5, "C").with_children(vec![leaf]);
        let b = Folder::new(4, "B").with_children(vec![Node::Folder(c)]);
        let a = Folder::new(2, "A").with_children(vec![Node::Folder(b)]);
        Folder::root().with_children(vec![Node::Folder(a)])
    }

    #[test]
    fn stack_tree_indents_one_level_per_depth() {
        let layout = stack_tree(&deep_root(), &HashSet::new(), &RowMetrics::default());
        let x_of = |id: u64| layout.rows.iter().find(|r| r.id == id).unwrap().rect.x;
        assert_eq!(x_of(2), 15.0);
        assert_eq!(x_of(4), 30.0);
        assert_eq!(x_of(5), 45.0);
        assert_eq!(x_of(7), 60.0);
    }

    #[test]
    fn deep_list_margin_reaches_first_item() {
        // Leaf row is y 96..120, x 60; the margin of C's list spans x 45..65.
        let layout = stack_tree(&deep_root(), &HashSet::new(), &RowMetrics::default());
        let res = DragGeometryResolver::new()
            .resolve_tree(&layout, Vec2::new(55.0, 100.0), DragKind::Component)
            .unwrap();
        assert_eq!(
            res.intent,
            DropIntent::ListInsert {
                list: ListTarget::Children(5),
                index: 0
            }
        );
    }

    // ── Folder headers ────────────────────────

    #[test]
    fn header_of_expanded_folder_targets_bottom_of_children() {
        let resolver = DragGeometryResolver::new();
        let res = resolver
            .resolve_tree(&expanded_layout(), Vec2::new(100.0, 10.0), DragKind::Component)
            .unwrap();
        assert_eq!(res.intent, node_intent(1, DropPosition::InsideBottom));
        assert_eq!(res.indicator.y, 96.0);
        assert_eq!(res.indicator.x, 20.0);
        assert_eq!(res.indicator.width, 260.0);
    }

    #[test]
    fn header_of_collapsed_folder_targets_header_bottom() {
        let collapsed: HashSet<u64> = [2].into_iter().collect();
        let layout = stack_tree(&sample_root(), &collapsed, &RowMetrics::default());
        let res = DragGeometryResolver::new()
            .resolve_tree(&layout, Vec2::new(100.0, 30.0), DragKind::Folder)
            .unwrap();
        assert_eq!(res.intent, node_intent(2, DropPosition::InsideBottom));
        assert_eq!(res.indicator.y, 48.0);
    }

    #[test]
    fn first_child_zone_splits_header() {
        let resolver = DragGeometryResolver::with_config(ResolverConfig {
            first_child_zone: true,
            ..ResolverConfig::default()
        });
        let layout = expanded_layout();

        let top = resolver
            .resolve_tree(&layout, Vec2::new(100.0, 26.0), DragKind::Component)
            .unwrap();
        assert_eq!(top.intent, node_intent(2, DropPosition::Inside));

        let bottom = resolver
            .resolve_tree(&layout, Vec2::new(100.0, 44.0), DragKind::Component)
            .unwrap();
        assert_eq!(bottom.intent, node_intent(2, DropPosition::InsideBottom));
    }

    // ── Component rows ────────────────────────

    #[test]
    fn component_row_halves() {
        let resolver = DragGeometryResolver::new();
        let layout = expanded_layout();

        let above = resolver
            .resolve_tree(&layout, Vec2::new(100.0, 75.0), DragKind::Component)
            .unwrap();
        assert_eq!(above.intent, node_intent(6, DropPosition::Above));
        assert_eq!(above.indicator.y, 72.0);

        let below = resolver
            .resolve_tree(&layout, Vec2::new(100.0, 90.0), DragKind::Component)
            .unwrap();
        assert_eq!(below.intent, node_intent(6, DropPosition::Below));
        assert_eq!(below.indicator.y, 96.0);
    }

    #[test]
    fn innermost_row_wins() {
        let res = DragGeometryResolver::new()
            .resolve_tree(&expanded_layout(), Vec2::new(100.0, 50.0), DragKind::Component)
            .unwrap();
        assert_eq!(res.intent, node_intent(3, DropPosition::Above));
    }

    // ── List margin ───────────────────────────

    #[test]
    fn left_margin_reorders_component_within_list() {
        let res = DragGeometryResolver::new()
            .resolve_tree(&expanded_layout(), Vec2::new(5.0, 80.0), DragKind::Component)
            .unwrap();
        assert_eq!(
            res.intent,
            DropIntent::ListInsert {
                list: ListTarget::Children(1),
                index: 1
            }
        );
        assert_eq!(res.indicator.y, 72.0);
    }

    #[test]
    fn left_margin_of_nested_list() {
        let res = DragGeometryResolver::new()
            .resolve_tree(&expanded_layout(), Vec2::new(20.0, 55.0), DragKind::Component)
            .unwrap();
        assert_eq!(
            res.intent,
            DropIntent::ListInsert {
                list: ListTarget::Children(2),
                index: 0
            }
        );
        assert_eq!(res.indicator.y, 48.0);
    }

    #[test]
    fn left_margin_ignored_for_folder_drags() {
        let res = DragGeometryResolver::new()
            .resolve_tree(&expanded_layout(), Vec2::new(20.0, 55.0), DragKind::Folder)
            .unwrap();
        assert_eq!(res.intent, node_intent(2, DropPosition::Below));
    }

    #[test]
    fn folder_drag_over_root_padding_is_none() {
        // Left of FolderA's row, below the root header: only the root body is hit.
        let res = DragGeometryResolver::new().resolve_tree(
            &expanded_layout(),
            Vec2::new(5.0, 60.0),
            DragKind::Folder,
        );
        assert!(res.is_none());
    }

    #[test]
    fn header_wins_over_list_margin() {
        let header = Rect::new(0.0, 0.0, 200.0, 20.0);
        let layout = TreeLayout {
            rows: vec![RowLayout {
                id: 2,
                depth: 1,
                rect: Rect::new(0.0, 0.0, 200.0, 60.0),
                shape: RowShape::Folder {
                    header,
                    children: Some(Rect::new(0.0, 20.0, 200.0, 40.0)),
                },
            }],
            lists: vec![ListLayout {
                parent: 2,
                depth: 2,
                rect: Rect::new(0.0, 0.0, 200.0, 60.0),
                items: Vec::new(),
            }],
        };
        let res = DragGeometryResolver::new()
            .resolve_tree(&layout, Vec2::new(5.0, 10.0), DragKind::Component)
            .unwrap();
        assert_eq!(res.intent, node_intent(2, DropPosition::InsideBottom));
        assert_eq!(res.indicator.y, 60.0);
    }

    #[test]
    fn no_geometry_match_is_none() {
        let resolver = DragGeometryResolver::new();
        assert!(resolver
            .resolve_tree(&expanded_layout(), Vec2::new(100.0, 500.0), DragKind::Component)
            .is_none());
        assert!(resolver
            .resolve_tree(&TreeLayout::default(), Vec2::new(0.0, 0.0), DragKind::Component)
            .is_none());
    }

    #[test]
    fn resolution_is_idempotent() {
        let resolver = DragGeometryResolver::new();
        let layout = expanded_layout();
        let pointer = Vec2::new(5.0, 80.0);
        assert_eq!(
            resolver.resolve_tree(&layout, pointer, DragKind::Component),
            resolver.resolve_tree(&layout, pointer, DragKind::Component)
        );
    }

    // ── Prompt editor ─────────────────────────

    fn section_rects() -> Vec<Rect> {
        vec![
            Rect::new(0.0, 0.0, 400.0, 50.0),
            Rect::new(0.0, 50.0, 400.0, 50.0),
            Rect::new(0.0, 100.0, 400.0, 50.0),
        ]
    }

    #[test]
    fn section_index_by_midpoint() {
        let resolver = DragGeometryResolver::new();
        let editor = Rect::new(0.0, 0.0, 400.0, 300.0);
        let sections = section_rects();

        let at = |y: f32| match resolver
            .resolve_sections(editor, &sections, Vec2::new(10.0, y))
            .unwrap()
            .intent
        {
            DropIntent::ListInsert { list: ListTarget::Sections, index } => index,
            other => panic!("unexpected intent {other:?}"),
        };
        assert_eq!(at(10.0), 0);
        assert_eq!(at(60.0), 1);
        assert_eq!(at(80.0), 2);
        assert_eq!(at(130.0), 3);
        assert_eq!(at(280.0), 3);
    }

    #[test]
    fn section_indicator_sits_under_previous_block() {
        let res = DragGeometryResolver::new()
            .resolve_sections(Rect::new(0.0, 0.0, 400.0, 300.0), &section_rects(), Vec2::new(10.0, 130.0))
            .unwrap();
        assert_eq!(res.indicator.y, 150.0);
    }

    #[test]
    fn section_pointer_outside_editor_is_none() {
        let res = DragGeometryResolver::new().resolve_sections(
            Rect::new(0.0, 0.0, 400.0, 300.0),
            &section_rects(),
            Vec2::new(500.0, 10.0),
        );
        assert!(res.is_none());
    }

    #[test]
    fn insertion_index_defaults_to_len() {
        assert_eq!(insertion_index(&[], 10.0), 0);
        assert_eq!(insertion_index(&section_rects(), 1000.0), 3);
    }
}
