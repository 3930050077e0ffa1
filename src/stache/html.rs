//! Default tag and attribute tables merged into every [`RenderConfig`].
//!
//! [`RenderConfig`]: crate::config::RenderConfig

/// Property names that cannot be bound from a template.
pub const RESERVED_PROPS: &[&str] = &["key", "children", "ref"];

/// Form controls whose `checked`/`value` are initial (uncontrolled) values.
pub const INPUT_TAGS: &[&str] = &["input", "select", "textarea"];

pub const HTML_TAGS: &[&str] = &[
    // HTML
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "command", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div",
    "dl", "dt", "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2",
    "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "i", "iframe", "img",
    "input", "ins", "kbd", "keygen", "label", "legend", "li", "link", "main", "map", "mark",
    "menu", "menuitem", "meta", "meter", "nav", "noscript", "object", "ol", "optgroup",
    "option", "output", "p", "param", "picture", "pre", "progress", "q", "rp", "rt", "ruby",
    "s", "samp", "script", "section", "select", "slot", "small", "source", "span", "strong",
    "style", "sub", "summary", "sup", "table", "tbody", "td", "template", "textarea", "tfoot",
    "th", "thead", "time", "title", "tr", "track", "u", "ul", "var", "video", "wbr",
    // SVG
    "svg", "circle", "clipPath", "defs", "desc", "ellipse", "foreignObject", "g", "image",
    "line", "linearGradient", "mask", "path", "pattern", "polygon", "polyline",
    "radialGradient", "rect", "stop", "symbol", "text", "tspan", "use",
    // MathML
    "math", "mi", "mn", "mo", "ms", "mtext",
];

/// Void tags: children are never rendered.
pub const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
    "meta", "param", "source", "track", "wbr",
];

/// Canonical synthetic event handler names; lookups are by lower-cased key.
pub const SYNTHETIC_EVENTS: &[&str] = &[
    "onTransitionEnd", "onAnimationStart", "onAnimationEnd", "onAnimationIteration",
    "onLoad", "onError", "onAbort", "onCanPlay", "onCanPlayThrough", "onDurationChange",
    "onEmptied", "onEncrypted", "onEnded", "onLoadedData", "onLoadedMetadata", "onLoadStart",
    "onPause", "onPlay", "onPlaying", "onProgress", "onRateChange", "onSeeked", "onSeeking",
    "onStalled", "onSuspend", "onTimeUpdate", "onVolumeChange", "onWaiting", "onWheel",
    "onScroll", "onTouchCancel", "onTouchEnd", "onTouchMove", "onTouchStart", "onSelect",
    "onClick", "onContextMenu", "onDoubleClick", "onDrag", "onDragEnd", "onDragEnter",
    "onDragExit", "onDragLeave", "onDragOver", "onDragStart", "onDrop", "onMouseDown",
    "onMouseEnter", "onMouseLeave", "onMouseMove", "onMouseOut", "onMouseOver", "onMouseUp",
    "onChange", "onInput", "onSubmit", "onFocus", "onBlur", "onKeyDown", "onKeyPress",
    "onKeyUp", "onCompositionEnd", "onCompositionStart", "onCompositionUpdate", "onCopy",
    "onCut", "onPaste",
];

/// `ondblclick` does not lower-case onto `onDoubleClick`.
pub const SYNTHETIC_EVENT_ALIASES: &[(&str, &str)] = &[("ondblclick", "onDoubleClick")];

/// Attributes that are present-or-absent; a bare binding means `true`.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen", "async", "autofocus", "autoplay", "checked", "controls", "default",
    "defer", "disabled", "formnovalidate", "hidden", "inert", "ismap", "itemscope", "loop",
    "multiple", "muted", "nomodule", "novalidate", "open", "playsinline", "readonly",
    "required", "reversed", "selected",
];

/// Host attribute names the rendering library expects camel-cased.
pub const HOST_PROP_RENAMES: &[(&str, &str)] = &[
    ("accept-charset", "acceptCharset"),
    ("accesskey", "accessKey"),
    ("allowfullscreen", "allowFullScreen"),
    ("autocapitalize", "autoCapitalize"),
    ("autocomplete", "autoComplete"),
    ("autofocus", "autoFocus"),
    ("autoplay", "autoPlay"),
    ("cellpadding", "cellPadding"),
    ("cellspacing", "cellSpacing"),
    ("charset", "charSet"),
    ("colspan", "colSpan"),
    ("contenteditable", "contentEditable"),
    ("crossorigin", "crossOrigin"),
    ("datetime", "dateTime"),
    ("enctype", "encType"),
    ("enterkeyhint", "enterKeyHint"),
    ("fetchpriority", "fetchPriority"),
    ("formaction", "formAction"),
    ("formenctype", "formEncType"),
    ("formmethod", "formMethod"),
    ("formnovalidate", "formNoValidate"),
    ("formtarget", "formTarget"),
    ("frameborder", "frameBorder"),
    ("hreflang", "hrefLang"),
    ("http-equiv", "httpEquiv"),
    ("inputmode", "inputMode"),
    ("itemid", "itemID"),
    ("itemprop", "itemProp"),
    ("itemref", "itemRef"),
    ("itemscope", "itemScope"),
    ("itemtype", "itemType"),
    ("maxlength", "maxLength"),
    ("minlength", "minLength"),
    ("nomodule", "noModule"),
    ("novalidate", "noValidate"),
    ("playsinline", "playsInline"),
    ("readonly", "readOnly"),
    ("referrerpolicy", "referrerPolicy"),
    ("rowspan", "rowSpan"),
    ("spellcheck", "spellCheck"),
    ("srcdoc", "srcDoc"),
    ("srclang", "srcLang"),
    ("srcset", "srcSet"),
    ("tabindex", "tabIndex"),
    ("usemap", "useMap"),
];

/// Canonical name → markup attribute, for names the library renames itself.
pub const MARKUP_ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("className", "class"),
    ("htmlFor", "for"),
    ("defaultValue", "value"),
    ("defaultChecked", "checked"),
];

pub fn is_input_tag(name: &str) -> bool {
    INPUT_TAGS.contains(&name)
}

pub fn is_reserved_prop(name: &str) -> bool {
    RESERVED_PROPS.contains(&name)
}
