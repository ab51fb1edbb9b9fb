//! Compiled-in translations. Columns follow [`super::Language::ALL`]: en, hi, mr, gu, pa.

use super::Row;

pub(super) const STATUS: &[(&str, Row)] = &[
    (
        "messageReceived",
        [
            "Your question has been received. Please wait...",
            "आपका प्रश्न प्राप्त हुआ है। कृपया प्रतीक्षा करें...",
            "तुमचा प्रश्न प्राप्त झाला आहे. कृपया प्रतीक्षा करा...",
            "તમારો પ્રશ્ન પ્રાપ્ત થયો છે. કૃપા કરીને રાહ જુઓ...",
            "ਤੁਹਾਡਾ ਸਵਾਲ ਮਿਲ ਗਿਆ ਹੈ। ਕਿਰਪਾ ਕਰਕੇ ਇੰਤਜ਼ਾਰ ਕਰੋ...",
        ],
    ),
    (
        "analyzingQuery",
        [
            "Analyzing your question...",
            "आपके प्रश्न का विश्लेषण हो रहा है...",
            "तुमच्या प्रश्नाचे विश्लेषण होत आहे...",
            "તમારા પ્રશ્નનું વિશ્લેષણ થઈ રહ્યું છે...",
            "ਤੁਹਾਡੇ ਸਵਾਲ ਦਾ ਵਿਸ਼ਲੇਸ਼ਣ ਹੋ ਰਿਹਾ ਹੈ...",
        ],
    ),
    (
        "generatingResponse",
        [
            "Generating response...",
            "उत्तर तैयार किया जा रहा है...",
            "उत्तर तयार केले जात आहे...",
            "જવાબ તૈયાર કરવામાં આવી રહ્યો છે...",
            "ਜਵਾਬ ਤਿਆਰ ਕੀਤਾ ਜਾ ਰਿਹਾ ਹੈ...",
        ],
    ),
    (
        "processing",
        [
            "Processing...",
            "प्रक्रिया जारी है...",
            "प्रक्रिया सुरू आहे...",
            "પ્રક્રિયા ચાલુ છે...",
            "ਪ੍ਰਕਿਰਿਆ ਜਾਰੀ ਹੈ...",
        ],
    ),
];

pub(super) const ERRORS: &[(&str, Row)] = &[
    (
        "processingError",
        [
            "Processing error occurred. Please try again.",
            "प्रोसेसिंग में त्रुटि हुई। कृपया पुनः प्रयास करें।",
            "प्रक्रिया त्रुटी आली आहे. कृपया पुन्हा प्रयत्न करा.",
            "પ્રક્રિયામાં ભૂલ આવી છે. કૃપા કરીને ફરીથી પ્રયાસ કરો.",
            "ਪ੍ਰਕਿਰਿਆ ਵਿੱਚ ਗਲਤੀ ਹੋਈ। ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।",
        ],
    ),
    (
        "connectionError",
        [
            "Failed to connect to AI server.",
            "AI सर्वर से कनेक्शन में विफलता।",
            "AI सर्व्हरशी कनेक्शन अयशस्वी.",
            "AI સર્વર સાથે જોડાણ અસફળ.",
            "AI ਸਰਵਰ ਨਾਲ ਕਨੈਕਸ਼ਨ ਅਸਫਲ।",
        ],
    ),
    (
        "responseError",
        [
            "Failed to process AI response.",
            "AI उत्तर संसाधित करने में विफलता।",
            "AI प्रतिसाद प्रक्रिया अयशस्वी.",
            "AI પ્રતિસાદ પ્રક્રિયા અસફળ.",
            "AI ਜਵਾਬ ਪ੍ਰਕਿਰਿਆ ਅਸਫਲ।",
        ],
    ),
    (
        "serverError",
        [
            "Internal server error.",
            "आंतरिक सर्वर त्रुटि।",
            "अंतर्गत सर्व्हर त्रुटी.",
            "આંતરિક સર્વર ભૂલ.",
            "ਅੰਦਰੂਨੀ ਸਰਵਰ ਗਲਤੀ।",
        ],
    ),
];

pub(super) const LABELS: &[(&str, Row)] = &[
    ("explanation", ["Explanation", "विस्तार", "तपशील", "વિગત", "ਵੇਰਵਾ"]),
    ("location", ["Location", "स्थान", "ठिकाण", "સ્થાન", "ਸਥਾਨ"]),
    ("topic", ["Topic", "विषय", "विषय", "વિષય", "ਵਿਸ਼ਾ"]),
    (
        "noAdvice",
        [
            "No advice available",
            "कोई सलाह उपलब्ध नहीं",
            "कोणताही सल्ला उपलब्ध नाही",
            "કોઈ સલાહ ઉપલબ્ધ નથી",
            "ਕੋਈ ਸਲਾਹ ਉਪਲਬਧ ਨਹੀਂ",
        ],
    ),
    (
        "notAvailable",
        ["Not available", "उपलब्ध नहीं", "उपलब्ध नाही", "ઉપલબ્ધ નથી", "ਉਪਲਬਧ ਨਹੀਂ"],
    ),
    (
        "weatherAnalysis",
        ["Weather Analysis", "मौसम विश्लेषण", "हवामान विश्लेषण", "હવામાન વિશ્લેષણ", "ਮੌਸਮ ਵਿਸ਼ਲੇਸ਼ਣ"],
    ),
    (
        "currentConditions",
        ["Current conditions", "वर्तमान स्थिति", "सध्याची स्थिती", "વર્તમાન સ્થિતિ", "ਮੌਜੂਦਾ ਹਾਲਾਤ"],
    ),
    (
        "farmingSuitability",
        ["Farming suitability", "खेती के लिए उपयुक्तता", "शेतीसाठी योग्यता", "ખેતી માટે યોગ્યતા", "ਖੇਤੀ ਲਈ ਯੋਗਤਾ"],
    ),
    (
        "next24h",
        ["Next 24 hours", "अगले 24 घंटे", "पुढील 24 तास", "આગામી 24 કલાક", "ਅਗਲੇ 24 ਘੰਟੇ"],
    ),
    (
        "soilAnalysis",
        ["Soil Analysis", "मिट्टी विश्लेषण", "माती विश्लेषण", "જમીન વિશ્લેષણ", "ਮਿੱਟੀ ਵਿਸ਼ਲੇਸ਼ਣ"],
    ),
    (
        "nutrientStatus",
        ["Nutrient status", "पोषक तत्व स्थिति", "पोषक स्थिती", "પોષક તત્વોની સ્થિતિ", "ਪੋਸ਼ਕ ਤੱਤਾਂ ਦੀ ਸਥਿਤੀ"],
    ),
    (
        "healthScore",
        ["Soil health score", "मृदा स्वास्थ्य स्कोर", "माती आरोग्य गुण", "જમીન આરોગ્ય સ્કોર", "ਮਿੱਟੀ ਸਿਹਤ ਸਕੋਰ"],
    ),
    (
        "immediateActions",
        ["Immediate actions", "तत्काल कार्य", "तातडीची कामे", "તાત્કાલિક પગલાં", "ਤੁਰੰਤ ਕਾਰਵਾਈਆਂ"],
    ),
    (
        "cropRecommendations",
        ["Recommended crops", "अनुशंसित फसलें", "शिफारस केलेली पिके", "ભલામણ કરેલ પાક", "ਸਿਫਾਰਸ਼ੀ ਫਸਲਾਂ"],
    ),
    (
        "marketInsights",
        ["Market Insights", "बाजार जानकारी", "बाजार माहिती", "બજાર માહિતી", "ਮੰਡੀ ਜਾਣਕਾਰੀ"],
    ),
    (
        "currentPrices",
        ["Current prices", "वर्तमान भाव", "सध्याचे भाव", "વર્તમાન ભાવ", "ਮੌਜੂਦਾ ਭਾਅ"],
    ),
    (
        "priceTrend",
        ["Price trend", "भाव का रुझान", "भावाचा कल", "ભાવનો વલણ", "ਭਾਅ ਦਾ ਰੁਝਾਨ"],
    ),
    (
        "sellingTiming",
        ["Selling time", "बेचने का समय", "विक्रीची वेळ", "વેચાણનો સમય", "ਵੇਚਣ ਦਾ ਸਮਾਂ"],
    ),
    (
        "priorityActions",
        ["Priority Actions", "प्राथमिक कार्य", "प्राधान्य कामे", "પ્રાથમિક પગલાં", "ਤਰਜੀਹੀ ਕਾਰਵਾਈਆਂ"],
    ),
    (
        "costBenefit",
        ["Cost-Benefit", "लागत-लाभ", "खर्च-फायदा", "ખર્ચ-લાભ", "ਲਾਗਤ-ਲਾਭ"],
    ),
    (
        "estimatedCost",
        ["Estimated cost", "अनुमानित लागत", "अंदाजे खर्च", "અંદાજિત ખર્ચ", "ਅੰਦਾਜ਼ਨ ਲਾਗਤ"],
    ),
    (
        "expectedReturn",
        ["Expected return", "अपेक्षित लाभ", "अपेक्षित परतावा", "અપેક્ષિત વળતર", "ਉਮੀਦ ਕੀਤਾ ਮੁਨਾਫਾ"],
    ),
    (
        "roiTimeframe",
        ["Timeframe", "समय सीमा", "कालावधी", "સમયગાળો", "ਸਮਾਂ ਸੀਮਾ"],
    ),
    (
        "riskWarnings",
        ["Risk Warnings", "जोखिम चेतावनी", "धोका इशारे", "જોખમ ચેતવણીઓ", "ਜੋਖਮ ਚੇਤਾਵਨੀਆਂ"],
    ),
    (
        "confidence",
        ["Confidence", "विश्वसनीयता", "विश्वासार्हता", "વિશ્વસનીયતા", "ਭਰੋਸੇਯੋਗਤਾ"],
    ),
];
