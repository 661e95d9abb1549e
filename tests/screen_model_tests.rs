use app_crawler::driver::driver::ElementRef;
use app_crawler::screen::registry::ScreenRegistry;
use app_crawler::screen::screen_model::{Screen, ScreenId, Widget, WidgetId};

// ============================================================================
// Helper builders
// ============================================================================

fn widgets(n: usize) -> Vec<Widget> {
    (0..n)
        .map(|i| Widget::new(ElementRef::new(format!("w{}", i))))
        .collect()
}

fn screen(signature: &str, parent: Option<(ScreenId, usize)>, widget_count: usize) -> Screen {
    Screen::new(
        signature.to_string(),
        "com.example.notes".to_string(),
        signature.to_string(),
        parent.map(|(s, _)| s),
        parent.map(|(screen, index)| WidgetId { screen, index }),
        widgets(widget_count),
    )
}

/// root (2 widgets) <- child via root#0 (1 widget) <- leaf via child#0 (no widgets)
fn chain() -> (ScreenRegistry, ScreenId, ScreenId, ScreenId) {
    let mut registry = ScreenRegistry::new();
    let root = registry.register(screen("Root;", None, 2));
    let child = registry.register(screen("Child;", Some((root, 0)), 1));
    let leaf = registry.register(screen("Leaf;", Some((child, 0)), 0));
    (registry, root, child, leaf)
}

// ============================================================================
// Screen
// ============================================================================

#[test]
fn screen_without_widgets_starts_finished() {
    assert!(screen("Empty;", None, 0).is_finished());
    assert!(!screen("Full;", None, 1).is_finished());
}

#[test]
fn screen_finishes_when_every_widget_does() {
    let mut s = screen("Two;", None, 2);
    s.widgets[0].set_finished(true);
    assert!(!s.is_finished());
    assert_eq!(s.first_unfinished(), Some(1));
    s.widgets[1].set_finished(true);
    assert!(s.is_finished());
    assert_eq!(s.unfinished_count(), 0);
}

#[test]
fn finishing_cascades_but_reopening_does_not() {
    let mut s = screen("Three;", None, 3);
    s.set_finished(true);
    assert!(s.widgets.iter().all(Widget::is_finished));

    s.set_finished(false);
    // widgets stay finished, so the screen still reports finished
    assert!(s.widgets.iter().all(Widget::is_finished));
    assert!(s.is_finished());

    s.widgets[2].set_finished(false);
    assert!(!s.is_finished());
}

#[test]
fn close_drops_widgets() {
    let mut s = screen("Closed;", None, 4);
    s.close();
    assert!(s.widgets.is_empty());
    assert!(s.is_finished());
}

#[test]
fn display_lists_widget_states() {
    let mut s = screen("Two;", None, 2);
    s.widgets[1].set_finished(true);
    let text = s.to_string();
    assert!(text.starts_with("name:Two;, depth:0, finished:false"));
    assert!(text.ends_with("widgets:2 0:false 1:true"));
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn ids_are_dense_and_lookup_is_per_package() {
    let (registry, root, child, leaf) = chain();
    assert_eq!((root, child, leaf), (ScreenId(0), ScreenId(1), ScreenId(2)));
    assert_eq!(registry.find("com.example.notes", "Child;"), Some(child));
    assert_eq!(registry.find("com.other", "Child;"), None);
    assert_eq!(registry.find("com.example.notes", "Missing;"), None);
    assert_eq!(registry.get(leaf).parent, Some(child));
    assert_eq!(registry.get(child).parent, Some(root));
}

#[test]
fn finishing_propagates_until_an_unfinished_ancestor() {
    let (mut registry, root, child, leaf) = chain();

    registry.propagate_finished(leaf);

    assert!(registry.widget(WidgetId { screen: child, index: 0 }).unwrap().is_finished());
    assert!(registry.get(child).is_finished());
    assert!(registry.widget(WidgetId { screen: root, index: 0 }).unwrap().is_finished());
    // root still has its second widget
    assert!(!registry.get(root).is_finished());
    for id in [root, child, leaf] {
        assert!(registry.invariant_holds(id));
    }
}

#[test]
fn unfinished_screen_reopens_its_whole_chain() {
    let (mut registry, root, child, leaf) = chain();
    registry.get_mut(root).set_finished(true);
    registry.get_mut(child).set_finished(true);

    // leaf got a new widget to test
    registry.get_mut(leaf).widgets = widgets(1);
    registry.reopen_ancestors(leaf);

    assert!(!registry.widget(WidgetId { screen: child, index: 0 }).unwrap().is_finished());
    assert!(!registry.get(child).is_finished());
    assert!(!registry.widget(WidgetId { screen: root, index: 0 }).unwrap().is_finished());
    assert!(!registry.get(root).is_finished());
    // untouched sibling widget stays finished
    assert!(registry.widget(WidgetId { screen: root, index: 1 }).unwrap().is_finished());
}

#[test]
fn package_counts_ignore_case() {
    let (mut registry, _, _, _) = chain();
    let mut foreign = screen("Dialog;", None, 0);
    foreign.package = "android".to_string();
    registry.register(foreign);

    assert_eq!(registry.count_in_package("COM.EXAMPLE.NOTES"), 3);
    assert_eq!(registry.len(), 4);
}
