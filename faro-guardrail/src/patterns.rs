//! The multilingual compliance pattern library.
//!
//! Four buckets per language: prescriptive verbs (scan only), advice
//! patterns, opinion-as-fact patterns and certainty/prediction patterns
//! (each with replacements). Patterns compile once, case-insensitive and
//! Unicode-aware; replacements use `${n}` capture references and are pure
//! text, so results depend only on inputs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::language::Language;

/// Compiled pattern set for one language.
pub struct LanguagePatterns {
    /// Prescriptive verbs; detection only, never rewritten directly.
    pub prescriptive: Vec<Regex>,
    /// Advice patterns with descriptive replacements.
    pub advice: Vec<(Regex, &'static str)>,
    /// Opinion-stated-as-fact patterns with replacements.
    pub opinion: Vec<(Regex, &'static str)>,
    /// Certainty/prediction patterns with replacements.
    pub certainty: Vec<(Regex, &'static str)>,
}

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .unwrap_or_else(|e| panic!("compliance pattern failed to compile: {pattern}: {e}"))
}

fn compile_pairs(pairs: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    pairs.iter().map(|(p, r)| (compile(p), *r)).collect()
}

const PRESCRIPTIVE_EN: &[&str] = &[
    r"\bshould\b",
    r"\bmust\b",
    r"\bought to\b",
    r"\bneed to\b",
    r"\bhave to\b",
    r"\bbetter to\b",
    r"\badvise\b",
    r"\brecommend\b",
    r"\bsuggest\b",
    r"\burge\b",
    r"\bencourage\b",
];

const PRESCRIPTIVE_ES: &[&str] = &[
    r"\bdebe\b",
    r"\bdebería\b",
    r"\bdeberías\b",
    r"\bhay que\b",
    r"\btiene que\b",
    r"\bnecesita\b",
    r"\brecomiendo\b",
    r"\brecomendamos\b",
    r"\bsugiero\b",
    r"\baconsejo\b",
    r"\bcompre\b",
    r"\bvenda\b",
    r"\binvierta\b",
];

const PRESCRIPTIVE_FR: &[&str] = &[
    r"\bdevrait\b",
    r"\bdevriez\b",
    r"\bdoit\b",
    r"\bdevez\b",
    r"\bfaut\b",
    r"\bconseille\b",
    r"\brecommande\b",
    r"\bsuggère\b",
    r"\bachetez\b",
    r"\bvendez\b",
    r"\binvestissez\b",
];

const PRESCRIPTIVE_DE: &[&str] = &[
    r"\bsollte\b",
    r"\bsollten\b",
    r"\bmuss\b",
    r"\bmüssen\b",
    r"\bempfehle\b",
    r"\bempfehlen\b",
    r"\brate\b",
    r"\braten\b",
    r"\bkaufen Sie\b",
    r"\bverkaufen Sie\b",
];

const PRESCRIPTIVE_IT: &[&str] = &[
    r"\bdovrebbe\b",
    r"\bdeve\b",
    r"\bbisogna\b",
    r"\bconsiglio\b",
    r"\braccomando\b",
    r"\bsuggerisco\b",
    r"\bcompri\b",
    r"\bvenda\b",
    r"\binvesta\b",
];

const PRESCRIPTIVE_PT: &[&str] = &[
    r"\bdeve\b",
    r"\bdeveria\b",
    r"\bprecisa\b",
    r"\brecomendo\b",
    r"\bsugiro\b",
    r"\baconselho\b",
    r"\bcompre\b",
    r"\bvenda\b",
    r"\binvista\b",
];

const PRESCRIPTIVE_JA: &[&str] = &[
    "べき",
    "なければならない",
    "必要があります",
    "お勧めします",
    "推奨します",
    "買うべき",
    "売るべき",
    "投資すべき",
    "買ってください",
    "売ってください",
];

const PRESCRIPTIVE_ZH: &[&str] = &[
    "应该",
    "必须",
    "需要",
    "建议",
    "推荐",
    "买入",
    "卖出",
    "投资",
    "购买",
    "出售",
];

const PRESCRIPTIVE_FA: &[&str] = &[
    "باید",
    "بایست",
    "لازم است",
    "توصیه می‌کنم",
    "پیشنهاد می‌کنم",
    "بخرید",
    "بفروشید",
    "سرمایه‌گذاری کنید",
];

const ADVICE_EN: &[(&str, &str)] = &[
    (
        r"\byou should (definitely |certainly |absolutely |really )?(buy|sell|invest in|hold|trade)\b",
        "one may consider reviewing options to ${2}",
    ),
    (
        r"\b(i |we )?(strongly |highly )?(recommend|suggest|advise)( that you| you)? (buy|sell|invest|hold|investing)\b",
        "the data shows factors related to ${5}",
    ),
    (
        r"\b(buy|sell|invest in|trade) (now|immediately|today|asap)\b",
        "trading options are currently available",
    ),
    (
        r"\bthis is a (good|great|excellent|perfect) (time|opportunity) to (buy|sell|invest)\b",
        "current market conditions may be relevant for analysis",
    ),
    (r"\bdon'?t (buy|sell|invest in)\b", "caution may be warranted regarding"),
    (
        r"\bavoid (buying|selling|investing in)\b",
        "careful consideration is suggested for",
    ),
    (r"\bstrong (buy|sell)\b", "notable ${1} activity"),
    (r"\b(overweight|underweight)\b", "adjusted allocation"),
    (
        r"\bwill (definitely |certainly |surely |absolutely )?(go up|rise|fall|increase|decrease)\b",
        "has historically shown ${2} movement",
    ),
    (
        r"\b(is |are )?(guaranteed|certain|sure) to (rise|fall|increase|decrease|succeed|make)\b",
        "has shown historical patterns of ${3}",
    ),
    (
        r"\bwill reach \$(\d+)",
        "is currently trading (historical highs around $$${1})",
    ),
    (r"\bprice target\b", "price analysis level"),
    (
        r"\b(buy|sell|get|grab|dump) (it|this|these|the stock|this stock)\b",
        "this asset is currently trading",
    ),
    (r"\bhold (it|this|these|the stock)\b", "the current position is noted"),
    (r"\bget in (now|before|while)\b", "trading activity is currently ongoing"),
    (r"\bget out (now|before|while)\b", "exit options are available"),
    (r"\bjump in\b", "entry options are available"),
    (r"\bpull out\b", "exit options are available"),
];

const ADVICE_ES: &[(&str, &str)] = &[
    (r"\bdebería(s)? (comprar|vender|invertir)\b", "considere revisar"),
    (
        r"\b(compre|venda|invierta) (ahora|inmediatamente|hoy)\b",
        "está disponible para operar",
    ),
    (
        r"\bes (buen|excelente|perfecto) momento para (comprar|vender)\b",
        "las condiciones actuales existen",
    ),
    (
        r"\bno (compre|venda|invierta)\b",
        "las condiciones actuales pueden requerir revisión",
    ),
    (
        r"\bevite (comprar|vender|invertir)\b",
        "las condiciones actuales pueden requerir revisión",
    ),
    (r"\brecomiendo (comprar|vender)\b", "los datos indican"),
    (r"\bva a (subir|bajar|aumentar|caer)\b", "ha mostrado movimiento"),
    (r"\bgarantizado\b", "históricamente ha mostrado"),
    (r"\bseguro que (sube|baja)\b", "históricamente ha mostrado"),
    (r"\bobjetivo de precio\b", "nivel de precio actual"),
    (r"\bcompra fuerte\b", "actividad notable"),
    (r"\bventa fuerte\b", "actividad notable"),
];

const ADVICE_FR: &[(&str, &str)] = &[
    (r"\bvous devriez (acheter|vendre|investir)\b", "à considérer"),
    (
        r"\b(achetez|vendez|investissez) (maintenant|immédiatement|aujourd'hui)\b",
        "disponible pour le trading",
    ),
    (
        r"\bc'est (un bon|le bon|un excellent) moment pour (acheter|vendre)\b",
        "les conditions actuelles existent",
    ),
    (
        r"\bn'(achetez|vendez|investissez) pas\b",
        "les conditions actuelles peuvent nécessiter une révision",
    ),
    (
        r"\bévitez d'(acheter|vendre|investir)\b",
        "les conditions actuelles peuvent nécessiter une révision",
    ),
    (r"\bje (recommande|conseille) d'(acheter|vendre)\b", "les données indiquent"),
    (r"\bva (monter|baisser|augmenter|chuter)\b", "a montré un mouvement"),
    (r"\bgaranti\b", "a historiquement montré"),
    (r"\bcible de prix\b", "niveau de prix actuel"),
    (r"\bachat fort\b", "activité notable"),
    (r"\bvente forte\b", "activité notable"),
];

const ADVICE_DE: &[(&str, &str)] = &[
    (r"\bSie sollten (kaufen|verkaufen|investieren)\b", "zu überprüfen"),
    (
        r"\b(kaufen|verkaufen|investieren) Sie (jetzt|sofort|heute)\b",
        "ist derzeit handelbar",
    ),
    (
        r"\bist (ein guter|der richtige|ein ausgezeichneter) Zeitpunkt zum (Kaufen|Verkaufen)\b",
        "aktuelle Marktbedingungen existieren",
    ),
    (
        r"\b(kaufen|verkaufen|investieren) Sie nicht\b",
        "aktuelle Bedingungen erfordern möglicherweise Überprüfung",
    ),
    (
        r"\bvermeiden Sie (zu kaufen|zu verkaufen|zu investieren)\b",
        "aktuelle Bedingungen erfordern möglicherweise Überprüfung",
    ),
    (r"\bich empfehle (zu kaufen|zu verkaufen)\b", "Daten zeigen"),
    (r"\bwird (steigen|fallen|zunehmen|abnehmen)\b", "hat Bewegung gezeigt"),
    (r"\bgarantiert\b", "hat historisch gezeigt"),
    (r"\bKursziel\b", "aktuelles Kursniveau"),
    (r"\bstarker Kauf\b", "bemerkenswerte Aktivität"),
    (r"\bstarker Verkauf\b", "bemerkenswerte Aktivität"),
];

const ADVICE_IT: &[(&str, &str)] = &[
    (r"\bdovresti (comprare|vendere|investire)\b", "da considerare"),
    (
        r"\b(compra|vendi|investi) (ora|immediatamente|oggi)\b",
        "disponibile per il trading",
    ),
    (
        r"\bè (un buon|il momento giusto|un ottimo) momento per (comprare|vendere)\b",
        "le condizioni attuali esistono",
    ),
    (
        r"\bnon (comprare|vendere|investire)\b",
        "le condizioni attuali potrebbero richiedere revisione",
    ),
    (
        r"\bevita di (comprare|vendere|investire)\b",
        "le condizioni attuali potrebbero richiedere revisione",
    ),
    (r"\b(consiglio|raccomando) di (comprare|vendere)\b", "i dati indicano"),
    (r"\b(salirà|scenderà|aumenterà|diminuirà)\b", "ha mostrato movimento"),
    (r"\bgarantito\b", "storicamente ha mostrato"),
    (r"\bobbiettivo di prezzo\b", "livello di prezzo attuale"),
    (r"\bforte acquisto\b", "attività notevole"),
    (r"\bforte vendita\b", "attività notevole"),
];

const ADVICE_PT: &[(&str, &str)] = &[
    (r"\bvocê deveria (comprar|vender|investir)\b", "a considerar"),
    (
        r"\b(compre|venda|invista) (agora|imediatamente|hoje)\b",
        "disponível para negociação",
    ),
    (
        r"\bé (um bom|o momento certo|um excelente) momento para (comprar|vender)\b",
        "as condições atuais existem",
    ),
    (r"\bnão (compre|venda|invista)\b", "as condições atuais podem requerer revisão"),
    (r"\bevite (comprar|vender|investir)\b", "as condições atuais podem requerer revisão"),
    (r"\b(recomendo|sugiro) (comprar|vender)\b", "os dados indicam"),
    (r"\bvai (subir|cair|aumentar|diminuir)\b", "mostrou movimento"),
    (r"\bgarantido\b", "historicamente mostrou"),
    (r"\balvo de preço\b", "nível de preço atual"),
    (r"\bcompra forte\b", "atividade notável"),
    (r"\bvenda forte\b", "atividade notável"),
];

const ADVICE_JA: &[(&str, &str)] = &[
    ("買うべきです", "検討する価値があります"),
    ("売るべきです", "検討する価値があります"),
    ("投資すべきです", "検討する価値があります"),
    ("今すぐ(買|売|投資)", "現在取引可能です"),
    ("(買|売|投資)を(お勧め|推奨)します", "データが示しています"),
    ("必ず(上がる|下がる|上昇|下落)", "動きを示しています"),
    ("確実に(上がる|下がる)", "過去に示しています"),
    ("目標株価", "現在の価格水準"),
    ("強い買い", "注目すべき活動"),
    ("強い売り", "注目すべき活動"),
];

const ADVICE_ZH: &[(&str, &str)] = &[
    ("应该(买入|卖出|投资)", "值得考虑"),
    ("(现在|立即|今天)(买入|卖出|投资)", "目前可交易"),
    ("(建议|推荐)(买入|卖出)", "数据显示"),
    ("不要(买入|卖出|投资)", "当前情况可能需要审查"),
    ("避免(买入|卖出|投资)", "当前情况可能需要审查"),
    ("一定会(上涨|下跌|增加|减少)", "已显示波动"),
    ("保证(上涨|下跌)", "历史上显示"),
    ("目标价", "当前价格水平"),
    ("强烈买入", "值得关注的活动"),
    ("强烈卖出", "值得关注的活动"),
];

const ADVICE_FA: &[(&str, &str)] = &[
    ("باید (بخرید|بفروشید|سرمایه‌گذاری کنید)", "قابل بررسی است"),
    ("(الان|فوری|امروز) (بخرید|بفروشید)", "در حال حاضر قابل معامله است"),
    ("(توصیه|پیشنهاد) می‌کنم (بخرید|بفروشید)", "داده‌ها نشان می‌دهد"),
    (
        "(نخرید|نفروشید|سرمایه‌گذاری نکنید)",
        "شرایط فعلی ممکن است نیاز به بررسی داشته باشد",
    ),
    ("حتما (بالا|پایین) می‌رود", "حرکت نشان داده است"),
    ("تضمین شده", "در گذشته نشان داده است"),
    ("هدف قیمت", "سطح قیمت فعلی"),
    ("خرید قوی", "فعالیت قابل توجه"),
    ("فروش قوی", "فعالیت قابل توجه"),
];

const OPINION_EN: &[(&str, &str)] = &[
    (
        r"\bthis (stock|asset|investment) is (undervalued|overvalued)\b",
        "this ${1} has metrics that some analysts consider relevant",
    ),
    (
        r"\b(definitely|certainly|obviously|clearly) a (buy|sell|hold)\b",
        "currently showing ${2} activity",
    ),
    (r"\ba no-brainer\b", "an opportunity that warrants analysis"),
    (r"\bno-brainer\b", "opportunity that warrants analysis"),
    (r"\beasy money\b", "a trading opportunity"),
    (r"\b(you |one )?cannot lose\b", "all investments carry inherent risk"),
    (r"\brisk-free\b", "an option with associated risks"),
    (r"\ba risk-free\b", "an option with associated risks"),
    (r"\bsafe bet\b", "an opportunity requiring due diligence"),
    (r"\ba safe bet\b", "an opportunity requiring due diligence"),
    (r"\bguaranteed (returns?|profit|gains?)\b", "potential ${1} (not guaranteed)"),
    (
        r"\b(is |are )?guaranteed to (rise|fall|succeed)\b",
        "has historical patterns related to ${2}",
    ),
    (
        r"\b(is |are )?sure to (rise|fall|make)\b",
        "has historical patterns related to ${2}",
    ),
];

const OPINION_ES: &[(&str, &str)] = &[
    (r"\b(está|es) (infravalorado|sobrevalorado)\b", "tiene métricas actuales"),
    (
        r"\b(definitivamente|claramente|obviamente) (comprar|vender)\b",
        "actualmente cotizando",
    ),
    (r"\bdinero fácil\b", "oportunidad de trading presente"),
    (r"\bno puede perder\b", "el riesgo es inherente al trading"),
    (r"\bsin riesgo\b", "con riesgos asociados"),
];

const OPINION_FR: &[(&str, &str)] = &[
    (r"\b(est|sont) (sous-évalué|surévalué)\b", "a des métriques actuelles"),
    (
        r"\b(définitivement|clairement|évidemment) (acheter|vendre)\b",
        "actuellement en trading",
    ),
    (r"\bargent facile\b", "opportunité de trading présente"),
    (r"\bne peut pas perdre\b", "le risque est inhérent au trading"),
    (r"\bsans risque\b", "avec des risques associés"),
];

const OPINION_DE: &[(&str, &str)] = &[
    (r"\b(ist|sind) (unterbewertet|überbewertet)\b", "hat aktuelle Kennzahlen"),
    (
        r"\b(definitiv|eindeutig|offensichtlich) (kaufen|verkaufen)\b",
        "derzeit handelbar",
    ),
    (r"\bleichtes Geld\b", "Handelsmöglichkeit vorhanden"),
    (r"\bkann nicht verlieren\b", "Risiko ist dem Handel inhärent"),
    (r"\brisikofrei\b", "mit verbundenen Risiken"),
];

const OPINION_IT: &[(&str, &str)] = &[
    (r"\b(è|sono) (sottovalutato|sopravvalutato)\b", "ha metriche attuali"),
    (
        r"\b(sicuramente|chiaramente|ovviamente) (comprare|vendere)\b",
        "attualmente in trading",
    ),
    (r"\bsoldi facili\b", "opportunità di trading presente"),
    (r"\bnon può perdere\b", "il rischio è inerente al trading"),
    (r"\bsenza rischio\b", "con rischi associati"),
];

const OPINION_PT: &[(&str, &str)] = &[
    (r"\b(está|é) (subvalorizado|sobrevalorizado)\b", "tem métricas atuais"),
    (
        r"\b(definitivamente|claramente|obviamente) (comprar|vender)\b",
        "atualmente negociando",
    ),
    (r"\bdinheiro fácil\b", "oportunidade de trading presente"),
    (r"\bnão pode perder\b", "o risco é inerente ao trading"),
    (r"\bsem risco\b", "com riscos associados"),
];

const OPINION_JA: &[(&str, &str)] = &[
    ("(割安|割高)です", "現在の指標があります"),
    ("絶対に(買い|売り)", "現在取引中"),
    ("簡単にお金", "取引機会があります"),
    ("損することはない", "リスクは取引に固有です"),
    ("リスクなし", "関連するリスクがあります"),
];

const OPINION_ZH: &[(&str, &str)] = &[
    ("(被低估|被高估)", "有当前指标"),
    ("绝对要(买|卖)", "目前正在交易"),
    ("轻松赚钱", "存在交易机会"),
    ("不会亏损", "风险是交易固有的"),
    ("无风险", "存在相关风险"),
];

const OPINION_FA: &[(&str, &str)] = &[
    ("(کم‌ارزش‌گذاری|بیش‌ارزش‌گذاری) شده", "دارای معیارهای فعلی است"),
    ("قطعا باید (بخرید|بفروشید)", "در حال معامله است"),
    ("پول آسان", "فرصت معاملاتی وجود دارد"),
    ("نمی‌توانید ضرر کنید", "ریسک ذاتی معاملات است"),
    ("بدون ریسک", "با ریسک‌های مرتبط"),
];

const CERTAINTY_EN: &[(&str, &str)] = &[
    (
        r"\bwill (increase|rise|go up|climb|surge)\b",
        "has historically shown ${1} patterns",
    ),
    (
        r"\bwill (decrease|fall|drop|decline|plunge)\b",
        "has historically shown ${1} patterns",
    ),
    (r"\b(is |are )?going to (increase|rise|go up)\b", "has shown recent upward movement"),
    (r"\b(is |are )?going to (decrease|fall|drop)\b", "has shown recent downward movement"),
    (r"\bexpect(?:ed|s)? to (reach|hit|exceed)\b", "has historically been known to ${1}"),
    (r"\blikely to (increase|rise|go up)\b", "has shown positive trend indicators"),
    (r"\blikely to (decrease|fall|drop)\b", "has shown negative trend indicators"),
    (r"\bpredicted to (rise|fall|reach|hit)\b", "has historical patterns of ${1}"),
    (r"\bforecast(?:ed)? to (rise|fall|reach)\b", "has historical patterns of ${1}"),
    (r"\bbound to (rise|fall|succeed|fail)\b", "has historical tendencies to ${1}"),
];

const CERTAINTY_ES: &[(&str, &str)] = &[
    (r"\bva a (subir|aumentar|crecer)\b", "ha mostrado movimiento alcista"),
    (r"\bva a (bajar|caer|disminuir)\b", "ha mostrado movimiento bajista"),
    (r"\bse espera que (alcance|llegue|supere)\b", "históricamente ha alcanzado"),
    (r"\bprobablemente (suba|aumente)\b", "ha mostrado tendencias positivas"),
    (r"\bprobablemente (baje|caiga)\b", "ha mostrado tendencias negativas"),
    (r"\bse predice que\b", "ha mostrado patrones históricos de"),
];

const CERTAINTY_FR: &[(&str, &str)] = &[
    (r"\bva (monter|augmenter|grimper)\b", "a montré un mouvement haussier"),
    (r"\bva (baisser|chuter|diminuer)\b", "a montré un mouvement baissier"),
    (r"\bon s'attend à (atteindre|dépasser)\b", "a historiquement atteint"),
    (r"\bdevrait (monter|augmenter)\b", "a montré des tendances positives"),
    (r"\bdevrait (baisser|chuter)\b", "a montré des tendances négatives"),
    (r"\bprévu pour\b", "a montré des modèles historiques de"),
];

const CERTAINTY_DE: &[(&str, &str)] = &[
    (r"\bwird (steigen|zunehmen|klettern)\b", "hat Aufwärtsbewegung gezeigt"),
    (r"\bwird (fallen|sinken|abnehmen)\b", "hat Abwärtsbewegung gezeigt"),
    (r"\bwird voraussichtlich (erreichen|übertreffen)\b", "hat historisch erreicht"),
    (r"\bwahrscheinlich (steigen|zunehmen)\b", "hat positive Trends gezeigt"),
    (r"\bwahrscheinlich (fallen|sinken)\b", "hat negative Trends gezeigt"),
    (r"\bprognostiziert\b", "hat historische Muster gezeigt von"),
];

const CERTAINTY_IT: &[(&str, &str)] = &[
    (r"\b(salirà|aumenterà|crescerà)\b", "ha mostrato movimento rialzista"),
    (r"\b(scenderà|calerà|diminuirà)\b", "ha mostrato movimento ribassista"),
    (r"\bsi prevede che (raggiunga|superi)\b", "storicamente ha raggiunto"),
    (r"\bprobabilmente (salirà|aumenterà)\b", "ha mostrato tendenze positive"),
    (r"\bprobabilmente (scenderà|calerà)\b", "ha mostrato tendenze negative"),
];

const CERTAINTY_PT: &[(&str, &str)] = &[
    (r"\bvai (subir|aumentar|crescer)\b", "mostrou movimento de alta"),
    (r"\bvai (cair|diminuir|descer)\b", "mostrou movimento de baixa"),
    (r"\bespera-se que (alcance|atinja|supere)\b", "historicamente alcançou"),
    (r"\bprovavelmente (subirá|aumentará)\b", "mostrou tendências positivas"),
    (r"\bprovavelmente (cairá|diminuirá)\b", "mostrou tendências negativas"),
];

const CERTAINTY_JA: &[(&str, &str)] = &[
    ("(上がる|上昇する|増加する)でしょう", "上昇の動きを示しています"),
    ("(下がる|下落する|減少する)でしょう", "下降の動きを示しています"),
    ("(到達|達成)すると予想", "歴史的に到達しています"),
    ("おそらく(上がる|上昇)", "ポジティブなトレンドを示しています"),
    ("おそらく(下がる|下落)", "ネガティブなトレンドを示しています"),
];

const CERTAINTY_ZH: &[(&str, &str)] = &[
    ("将会(上涨|增加|攀升)", "已显示上行走势"),
    ("将会(下跌|减少|下降)", "已显示下行走势"),
    ("预计将(达到|超过)", "历史上曾达到"),
    ("可能会(上涨|增加)", "已显示积极趋势"),
    ("可能会(下跌|减少)", "已显示消极趋势"),
];

const CERTAINTY_FA: &[(&str, &str)] = &[
    ("(افزایش|رشد|صعود) خواهد کرد", "حرکت صعودی نشان داده است"),
    ("(کاهش|سقوط|نزول) خواهد کرد", "حرکت نزولی نشان داده است"),
    ("انتظار می‌رود (برسد|تجاوز کند)", "در گذشته رسیده است"),
    ("احتمالا (افزایش|رشد) می‌یابد", "روندهای مثبت نشان داده است"),
    ("احتمالا (کاهش|سقوط) می‌کند", "روندهای منفی نشان داده است"),
];

/// Disclaimer phrases per language; the presence check scans every list to
/// tolerate mixed-language content.
pub const DISCLAIMER_PHRASES: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "not financial advice",
            "not investment advice",
            "informational purposes only",
            "educational purposes only",
            "data analysis only",
            "consult a financial advisor",
            "consult a qualified professional",
            "past performance",
        ],
    ),
    (
        "es",
        &[
            "no es asesoramiento financiero",
            "no es consejo de inversión",
            "solo con fines informativos",
            "solo con fines educativos",
            "solo análisis de datos",
            "consulte a un asesor financiero",
            "rendimiento pasado",
        ],
    ),
    (
        "fr",
        &[
            "n'est pas un conseil financier",
            "n'est pas un conseil d'investissement",
            "à des fins d'information uniquement",
            "à des fins éducatives uniquement",
            "analyse de données uniquement",
            "consultez un conseiller financier",
            "performance passée",
        ],
    ),
    (
        "de",
        &[
            "keine finanzberatung",
            "keine anlageberatung",
            "nur zu informationszwecken",
            "nur zu bildungszwecken",
            "nur datenanalyse",
            "konsultieren sie einen finanzberater",
            "vergangene leistung",
        ],
    ),
    (
        "it",
        &[
            "non è consulenza finanziaria",
            "non è consulenza sugli investimenti",
            "solo a scopo informativo",
            "solo a scopo educativo",
            "solo analisi dei dati",
            "consultare un consulente finanziario",
            "performance passata",
        ],
    ),
    (
        "pt",
        &[
            "não é aconselhamento financeiro",
            "não é aconselhamento de investimento",
            "apenas para fins informativos",
            "apenas para fins educacionais",
            "apenas análise de dados",
            "consulte um consultor financeiro",
            "desempenho passado",
        ],
    ),
    (
        "ja",
        &[
            "金融アドバイスではありません",
            "投資アドバイスではありません",
            "情報提供のみ",
            "教育目的のみ",
            "データ分析のみ",
            "ファイナンシャルアドバイザーに相談してください",
            "過去のパフォーマンス",
        ],
    ),
    (
        "zh",
        &[
            "不构成财务建议",
            "不构成投资建议",
            "仅供参考",
            "仅供教育目的",
            "仅供数据分析",
            "请咨询财务顾问",
            "过去的表现",
        ],
    ),
    (
        "fa",
        &[
            "مشاوره مالی نیست",
            "مشاوره سرمایه‌گذاری نیست",
            "فقط برای اهداف اطلاعاتی",
            "فقط برای اهداف آموزشی",
            "فقط تجزیه و تحلیل داده",
            "با یک مشاور مالی مشورت کنید",
            "عملکرد گذشته",
        ],
    ),
];

fn raw_tables(
    lang: Language,
) -> (
    &'static [&'static str],
    &'static [(&'static str, &'static str)],
    &'static [(&'static str, &'static str)],
    &'static [(&'static str, &'static str)],
) {
    match lang {
        Language::Es => (PRESCRIPTIVE_ES, ADVICE_ES, OPINION_ES, CERTAINTY_ES),
        Language::Fr => (PRESCRIPTIVE_FR, ADVICE_FR, OPINION_FR, CERTAINTY_FR),
        Language::De => (PRESCRIPTIVE_DE, ADVICE_DE, OPINION_DE, CERTAINTY_DE),
        Language::It => (PRESCRIPTIVE_IT, ADVICE_IT, OPINION_IT, CERTAINTY_IT),
        Language::Pt => (PRESCRIPTIVE_PT, ADVICE_PT, OPINION_PT, CERTAINTY_PT),
        Language::Ja => (PRESCRIPTIVE_JA, ADVICE_JA, OPINION_JA, CERTAINTY_JA),
        Language::Zh => (PRESCRIPTIVE_ZH, ADVICE_ZH, OPINION_ZH, CERTAINTY_ZH),
        Language::Fa => (PRESCRIPTIVE_FA, ADVICE_FA, OPINION_FA, CERTAINTY_FA),
        Language::En | Language::Auto => (PRESCRIPTIVE_EN, ADVICE_EN, OPINION_EN, CERTAINTY_EN),
    }
}

static COMPILED: Lazy<HashMap<Language, LanguagePatterns>> = Lazy::new(|| {
    Language::all_concrete()
        .into_iter()
        .map(|lang| {
            let (prescriptive, advice, opinion, certainty) = raw_tables(lang);
            (
                lang,
                LanguagePatterns {
                    prescriptive: prescriptive.iter().map(|p| compile(p)).collect(),
                    advice: compile_pairs(advice),
                    opinion: compile_pairs(opinion),
                    certainty: compile_pairs(certainty),
                },
            )
        })
        .collect()
});

/// Compiled pattern set for `lang`; `Auto` resolves to the English tables.
#[must_use]
pub fn patterns_for(lang: Language) -> &'static LanguagePatterns {
    let key = match lang {
        Language::Auto => Language::En,
        other => other,
    };
    COMPILED.get(&key).expect("all concrete languages compiled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_table_compiles() {
        for lang in Language::all_concrete() {
            let patterns = patterns_for(lang);
            assert!(!patterns.prescriptive.is_empty(), "{lang}: prescriptive");
            assert!(!patterns.advice.is_empty(), "{lang}: advice");
        }
    }

    #[test]
    fn capture_group_replacements_are_grammatical() {
        let patterns = patterns_for(Language::En);
        let (re, replacement) = &patterns.advice[0];
        let out = re.replace("You should definitely buy AAPL", *replacement);
        assert_eq!(out, "one may consider reviewing options to buy AAPL");
    }

    #[test]
    fn dollar_targets_keep_the_literal_dollar_sign() {
        let patterns = patterns_for(Language::En);
        let (re, replacement) = patterns
            .advice
            .iter()
            .find(|(re, _)| re.as_str().contains("reach"))
            .unwrap();
        let out = re.replace("It will reach $200", *replacement);
        assert_eq!(out, "It is currently trading (historical highs around $200)");
    }
}
